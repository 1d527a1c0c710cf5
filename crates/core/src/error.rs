//! 에러 타입 — 도메인별 에러 정의
//!
//! [`DrydockError`]는 최상위 에러 타입이며, 각 모듈 크레이트의 구체적인
//! 에러는 `From` 구현을 통해 이 타입의 하위 fault로 변환되어 전파됩니다.

/// Drydock 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DrydockError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 소스 해석/접근 에러
    #[error("source error: {0}")]
    Source(#[from] SourceFault),

    /// 카탈로깅 에러
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogFault),

    /// 파이프라인 실행 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineFault),

    /// 메타데이터 코덱 에러
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DrydockError {
    /// 취소로 인한 종료인지 반환합니다.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Pipeline(PipelineFault::Cancelled))
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 소스 해석/접근 에러
#[derive(Debug, thiserror::Error)]
pub enum SourceFault {
    /// 어떤 스킴으로도 해석할 수 없는 입력
    #[error("unable to resolve source: {0}")]
    Unresolvable(String),

    /// 소스가 지원하지 않는 스코프 요청
    #[error("unsupported scope: {0}")]
    UnsupportedScope(String),

    /// 소스 열기 실패 (아카이브, 매니페스트, daemon 등)
    #[error("failed to open source: {0}")]
    OpenFailed(String),

    /// 열린 소스에서의 해석 실패 (glob, 메타데이터, 콘텐츠)
    #[error("failed to resolve within source: {0}")]
    ResolveFailed(String),
}

/// 카탈로깅 에러
#[derive(Debug, thiserror::Error)]
pub enum CatalogFault {
    /// 특정 cataloger의 치명적 실패
    #[error("cataloger '{name}' failed: {reason}")]
    CatalogerFailed { name: String, reason: String },

    /// resolver 실패로 인한 중단
    #[error("resolver failed: {0}")]
    ResolverFailed(String),

    /// 콘텐츠 인코딩 실패
    #[error("encode failed: {0}")]
    EncodeFailed(String),
}

/// 파이프라인 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineFault {
    /// 파이프라인 구성/초기화 실패
    #[error("init failed: {0}")]
    InitFailed(String),

    /// 호출자 요청으로 취소됨
    #[error("cancelled")]
    Cancelled,

    /// 해당 소스 스킴이 지원하지 않는 작업 (예: 비이미지 업로드)
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// 업로드 실패
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// 메타데이터 코덱 에러
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// 디코딩 시 인식할 수 없는 discriminator
    #[error("unsupported source metadata kind: {0}")]
    UnsupportedMetadataKind(String),

    /// 인코딩 실패
    #[error("encode failed: {reason}")]
    EncodeFailed { reason: String },

    /// 선언된 타입에 대해 구조적으로 맞지 않는 payload
    #[error("decode failed: {reason}")]
    DecodeFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "source.scope".to_owned(),
            reason: "must be one of: squashed, all-layers".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("source.scope"));
        assert!(msg.contains("squashed"));
    }

    #[test]
    fn source_fault_display() {
        let err = SourceFault::Unresolvable("bogus:input".to_owned());
        assert!(err.to_string().contains("bogus:input"));
    }

    #[test]
    fn catalog_fault_display() {
        let err = CatalogFault::CatalogerFailed {
            name: "contents-cataloger".to_owned(),
            reason: "glob failed".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("contents-cataloger"));
        assert!(msg.contains("glob failed"));
    }

    #[test]
    fn pipeline_fault_cancelled_is_cancellation() {
        let err: DrydockError = PipelineFault::Cancelled.into();
        assert!(err.is_cancellation());

        let other: DrydockError = PipelineFault::InitFailed("x".to_owned()).into();
        assert!(!other.is_cancellation());
    }

    #[test]
    fn codec_error_display() {
        let err = CodecError::UnsupportedMetadataKind("tarball".to_owned());
        assert!(err.to_string().contains("tarball"));
    }

    #[test]
    fn sub_errors_convert_into_top_error() {
        let err: DrydockError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, DrydockError::Config(_)));

        let err: DrydockError = SourceFault::OpenFailed("x".to_owned()).into();
        assert!(matches!(err, DrydockError::Source(_)));

        let err: DrydockError = CodecError::DecodeFailed {
            reason: "x".to_owned(),
        }
        .into();
        assert!(matches!(err, DrydockError::Codec(_)));
    }
}
