//! 파이프라인 에러 타입
//!
//! 파이프라인 실행의 모든 내부 에러는 [`PipelineError`]로 수렴한 뒤
//! 완료 채널에 실리기 전에 [`DrydockError`]로 변환됩니다. 취소는
//! 일반 실패와 구분되는 별도 variant입니다.

use drydock_cataloger::CatalogError;
use drydock_core::error::{DrydockError, PipelineFault};
use drydock_core::types::Scheme;
use drydock_source::SourceError;

/// 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 구성/초기화 실패
    #[error("pipeline init failed: {0}")]
    Init(String),

    /// 호출자 요청으로 취소됨 — 자원 해제는 여전히 보장된다
    #[error("pipeline cancelled")]
    Cancelled,

    /// 소스 해석 실패
    #[error(transparent)]
    Source(#[from] SourceError),

    /// 카탈로깅 실패
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// 업로드 실패
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// 업로드 페이로드 조립/전송 에러
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// 이미지 외의 소스 스킴에 대한 업로드 요청
    #[error("unable to upload results: only image sources are supported (scheme: {scheme})")]
    UnsupportedScheme {
        /// 요청된 소스의 스킴
        scheme: Scheme,
    },

    /// Dockerfile 읽기 실패
    #[error("unable to read dockerfile '{path}': {reason}")]
    Dockerfile {
        /// Dockerfile 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// import 클라이언트 전송 실패
    #[error("import transport error: {0}")]
    Transport(String),
}

impl From<PipelineError> for DrydockError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Init(reason) => {
                DrydockError::Pipeline(PipelineFault::InitFailed(reason))
            }
            PipelineError::Cancelled => DrydockError::Pipeline(PipelineFault::Cancelled),
            PipelineError::Source(e) => e.into(),
            PipelineError::Catalog(e) => e.into(),
            PipelineError::Upload(UploadError::UnsupportedScheme { scheme }) => {
                DrydockError::Pipeline(PipelineFault::UnsupportedOperation(format!(
                    "upload is not supported for scheme '{scheme}'"
                )))
            }
            PipelineError::Upload(e) => {
                DrydockError::Pipeline(PipelineFault::UploadFailed(e.to_string()))
            }
        }
    }
}
