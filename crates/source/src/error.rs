//! 소스 크레이트 에러 타입
//!
//! [`SourceError`]는 소스 해석/접근 중 발생할 수 있는 모든 에러를
//! 나타냅니다. `From<SourceError> for DrydockError` 구현을 통해 `?`
//! 연산자로 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! 파일 단위 스킵 조건(권한 거부)은 [`SourceError::is_permission_denied`]
//! 로 분류할 수 있으며, cataloger가 치명 에러와 구분하는 데 사용합니다.

use drydock_core::error::{DrydockError, SourceFault};
use drydock_core::types::{Scheme, Scope};

/// 소스 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 어떤 스킴으로도 해석할 수 없는 입력
    #[error("unable to resolve source from input: '{input}'")]
    Unresolvable {
        /// 사용자 입력
        input: String,
    },

    /// 소스 종류가 지원하지 않는 스코프 요청
    #[error("source scheme '{scheme}' does not support scope '{scope}'")]
    UnsupportedScope {
        /// 소스 스킴
        scheme: Scheme,
        /// 요청된 스코프
        scope: Scope,
    },

    /// 이 resolver의 스코프에서 위치를 찾을 수 없음
    #[error("file not found in source: {path}")]
    NotFound {
        /// 해석 실패한 경로
        path: String,
    },

    /// 권한 거부 — cataloger의 파일 단위 스킵 조건
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// 접근 거부된 경로
        path: String,
    },

    /// 아카이브 해석/추출 실패
    #[error("archive error: {path}: {reason}")]
    Archive {
        /// 아카이브 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 이미지 매니페스트 해석 실패
    #[error("image manifest error: {reason}")]
    Manifest {
        /// 실패 사유
        reason: String,
    },

    /// Docker daemon 통신 실패
    #[error("docker daemon error: {0}")]
    Daemon(String),

    /// 잘못된 glob 패턴
    #[error("invalid glob pattern '{pattern}': {reason}")]
    Glob {
        /// 문제의 패턴
        pattern: String,
        /// 실패 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 내부 실행 에러 (blocking task join 실패 등)
    #[error("internal error: {0}")]
    Internal(String),
}

impl SourceError {
    /// I/O 에러를 종류에 따라 분류하여 변환합니다.
    pub(crate) fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source: err },
        }
    }

    /// 권한 거부로 인한 에러인지 반환합니다.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::PermissionDenied { .. } => true,
            Self::Io { source, .. } => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

impl From<SourceError> for DrydockError {
    fn from(err: SourceError) -> Self {
        let fault = match &err {
            SourceError::Unresolvable { input } => SourceFault::Unresolvable(input.clone()),
            SourceError::UnsupportedScope { .. } => {
                SourceFault::UnsupportedScope(err.to_string())
            }
            SourceError::Archive { .. }
            | SourceError::Manifest { .. }
            | SourceError::Daemon(_)
            | SourceError::Internal(_) => SourceFault::OpenFailed(err.to_string()),
            SourceError::NotFound { .. }
            | SourceError::PermissionDenied { .. }
            | SourceError::Glob { .. }
            | SourceError::Io { .. } => SourceFault::ResolveFailed(err.to_string()),
        };
        DrydockError::Source(fault)
    }
}
