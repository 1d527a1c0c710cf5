//! cataloger 에러 타입
//!
//! 권한 거부 같은 파일 단위 조건은 cataloger 내부에서 복구(스킵)되고,
//! 그 외의 resolver 실패는 [`CatalogError`]로 해당 cataloger의 실행과
//! 파이프라인 전체를 중단시킵니다.

use drydock_core::error::{CatalogFault, DrydockError};
use drydock_source::error::SourceError;

/// cataloger 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// cataloger의 치명적 실패
    #[error("cataloger '{name}' failed: {reason}")]
    Cataloger {
        /// cataloger 이름
        name: String,
        /// 실패 사유
        reason: String,
    },

    /// resolver 실패 (glob, 메타데이터, 콘텐츠 열기)
    #[error(transparent)]
    Resolver(#[from] SourceError),

    /// 콘텐츠 읽기/인코딩 실패
    #[error("content encode error: {path}: {reason}")]
    Encode {
        /// 대상 파일의 real path
        path: String,
        /// 실패 사유
        reason: String,
    },
}

impl From<CatalogError> for DrydockError {
    fn from(err: CatalogError) -> Self {
        let fault = match err {
            CatalogError::Cataloger { name, reason } => {
                CatalogFault::CatalogerFailed { name, reason }
            }
            CatalogError::Resolver(e) => CatalogFault::ResolverFailed(e.to_string()),
            CatalogError::Encode { path, reason } => {
                CatalogFault::EncodeFailed(format!("{path}: {reason}"))
            }
        };
        DrydockError::Catalog(fault)
    }
}
