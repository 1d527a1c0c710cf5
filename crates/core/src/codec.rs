//! 메타데이터 코덱 -- 소스 메타데이터의 tagged-union 직렬화
//!
//! 소스 메타데이터를 `{"type": <discriminator>, "target": <payload>}`
//! 형태의 self-describing 봉투로 인코딩/디코딩합니다. 봉투 수준에서
//! `target`은 불투명하며, 디코딩 시 `type` 값만으로 payload 형태를
//! 결정합니다. 인식할 수 없는 `type`은 명시적 에러로 거부됩니다.
//!
//! 라운드트립 보장: 지원하는 모든 variant에 대해
//! `decode(encode(m)) == m`이 성립합니다.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::types::{DirectoryMetadata, ImageMetadata, Scope, SourceMetadata};

/// 이미지 소스의 discriminator 값
pub const SOURCE_TYPE_IMAGE: &str = "image";
/// 디렉토리 소스의 discriminator 값
pub const SOURCE_TYPE_DIRECTORY: &str = "directory";

/// 인코딩 봉투 (wire 형태)
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// discriminator
    #[serde(rename = "type")]
    kind: String,
    /// 스킴별 payload (봉투 수준에서는 해석하지 않음)
    target: serde_json::Value,
}

/// 이미지 variant의 payload -- 이미지 기술 정보에 스코프가 덧붙는다
#[derive(Debug, Serialize, Deserialize)]
struct ImageTarget {
    /// 스캔에 사용된 스코프
    scope: Scope,
    /// 이미지 기술 정보 (평탄화)
    #[serde(flatten)]
    image: ImageMetadata,
}

/// 디코딩 결과
///
/// 디렉토리 payload에는 스코프가 실리지 않으므로 `scope`는 이미지
/// variant에서만 값을 가집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSource {
    /// 복원된 소스 메타데이터
    pub metadata: SourceMetadata,
    /// 이미지 variant의 스코프 (디렉토리는 None)
    pub scope: Option<Scope>,
}

/// 소스 메타데이터를 봉투 형태로 인코딩합니다.
///
/// # Errors
///
/// payload 직렬화가 실패하면 `CodecError::EncodeFailed`를 반환합니다.
pub fn encode_source_metadata(
    metadata: &SourceMetadata,
    scope: Scope,
) -> Result<serde_json::Value, CodecError> {
    let envelope = match metadata {
        SourceMetadata::Image(image) => Envelope {
            kind: SOURCE_TYPE_IMAGE.to_owned(),
            target: serde_json::to_value(ImageTarget {
                scope,
                image: image.clone(),
            })
            .map_err(|e| CodecError::EncodeFailed {
                reason: e.to_string(),
            })?,
        },
        SourceMetadata::Directory(dir) => Envelope {
            kind: SOURCE_TYPE_DIRECTORY.to_owned(),
            target: serde_json::Value::String(dir.path.clone()),
        },
    };

    serde_json::to_value(envelope).map_err(|e| CodecError::EncodeFailed {
        reason: e.to_string(),
    })
}

/// 봉투 형태의 값에서 소스 메타데이터를 복원합니다.
///
/// `type` 값에 따라 배타적으로 분기하여 `target`을 디코딩합니다.
/// 선언된 타입과 구조가 맞지 않는 payload는 `DecodeFailed`,
/// 인식할 수 없는 `type`은 `UnsupportedMetadataKind`입니다.
pub fn decode_source_metadata(value: &serde_json::Value) -> Result<DecodedSource, CodecError> {
    let envelope: Envelope =
        serde_json::from_value(value.clone()).map_err(|e| CodecError::DecodeFailed {
            reason: e.to_string(),
        })?;

    match envelope.kind.as_str() {
        SOURCE_TYPE_IMAGE => {
            let target: ImageTarget =
                serde_json::from_value(envelope.target).map_err(|e| CodecError::DecodeFailed {
                    reason: format!("image target: {e}"),
                })?;
            Ok(DecodedSource {
                metadata: SourceMetadata::Image(target.image),
                scope: Some(target.scope),
            })
        }
        SOURCE_TYPE_DIRECTORY => {
            let path = envelope
                .target
                .as_str()
                .ok_or_else(|| CodecError::DecodeFailed {
                    reason: "directory target must be a path string".to_owned(),
                })?;
            Ok(DecodedSource {
                metadata: SourceMetadata::Directory(DirectoryMetadata {
                    path: path.to_owned(),
                }),
                scope: None,
            })
        }
        other => Err(CodecError::UnsupportedMetadataKind(other.to_owned())),
    }
}
