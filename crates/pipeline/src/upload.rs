//! 업로드 페이로드 조립
//!
//! 인벤토리 서비스로 보낼 [`ImportRequest`]를 조립합니다. 이 크레이트는
//! 페이로드를 만들고 [`ImportClient`]에 넘길 뿐, HTTP 전송 자체는 외부
//! 협력자가 구현합니다. 업로드는 이미지 스킴에서만 의미가 있으며, 다른
//! 스킴에 대한 요청은 클라이언트 호출 전에 거부됩니다.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use drydock_core::catalog::Catalog;
use drydock_core::config::UploadConfig;
use drydock_core::types::{Distro, ImageMetadata, SourceMetadata};

use crate::error::UploadError;

/// 인벤토리 서비스로 전달되는 업로드 페이로드
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// 소스 이미지의 기술 정보
    pub image: ImageMetadata,
    /// 소스 메타데이터
    pub source: SourceMetadata,
    /// 완성된 카탈로그
    pub catalog: Arc<Catalog>,
    /// 탐지된 배포판 (있을 경우)
    pub distro: Option<Distro>,
    /// 함께 업로드할 Dockerfile 원본 (있을 경우)
    pub dockerfile: Option<Bytes>,
    /// 기존 업로드 덮어쓰기 여부
    pub overwrite_existing: bool,
}

/// 인벤토리 서비스 전송 계약
///
/// 구체적인 전송(HTTP 등)은 이 워크스페이스 밖에서 구현됩니다.
#[async_trait]
pub trait ImportClient: Send + Sync {
    /// 조립된 페이로드를 전송합니다.
    async fn import(&self, request: &ImportRequest) -> Result<(), UploadError>;
}

/// 업로드 페이로드를 조립합니다.
///
/// # Errors
///
/// - 비이미지 스킴: `UploadError::UnsupportedScheme` — 어떤 클라이언트
///   호출도 일어나기 전에 거부된다
/// - Dockerfile 읽기 실패: `UploadError::Dockerfile`
pub async fn build_import_request(
    source: &SourceMetadata,
    catalog: Arc<Catalog>,
    distro: Option<Distro>,
    config: &UploadConfig,
) -> Result<ImportRequest, UploadError> {
    let image = match source {
        SourceMetadata::Image(image) => image.clone(),
        other => {
            return Err(UploadError::UnsupportedScheme {
                scheme: other.scheme(),
            });
        }
    };

    let dockerfile = if config.dockerfile.is_empty() {
        None
    } else {
        let bytes = tokio::fs::read(&config.dockerfile)
            .await
            .map_err(|e| UploadError::Dockerfile {
                path: config.dockerfile.clone(),
                reason: e.to_string(),
            })?;
        Some(Bytes::from(bytes))
    };

    Ok(ImportRequest {
        image,
        source: source.clone(),
        catalog,
        distro,
        dockerfile,
        overwrite_existing: config.overwrite_existing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use drydock_core::types::{DirectoryMetadata, LayerMetadata, Scheme, Scope};

    fn image_source() -> SourceMetadata {
        SourceMetadata::Image(ImageMetadata {
            user_input: "alpine:3.19".to_owned(),
            repository: "alpine".to_owned(),
            tag: "3.19".to_owned(),
            manifest_digest: "sha256:abc".to_owned(),
            size: 100,
            layers: vec![LayerMetadata {
                media_type: "application/vnd.docker.image.rootfs.diff.tar".to_owned(),
                digest: "sha256:layer".to_owned(),
                size: 100,
            }],
        })
    }

    fn directory_source() -> SourceMetadata {
        SourceMetadata::Directory(DirectoryMetadata {
            path: "/tmp/proj".to_owned(),
        })
    }

    fn catalog_for(source: &SourceMetadata) -> Arc<Catalog> {
        Arc::new(Catalog::new(source.clone(), Scope::Squashed))
    }

    #[tokio::test]
    async fn builds_request_for_image_source() {
        let source = image_source();
        let catalog = catalog_for(&source);

        let request = build_import_request(
            &source,
            catalog,
            None,
            &UploadConfig {
                enabled: true,
                host: "inventory.example.com".to_owned(),
                overwrite_existing: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(request.image.repository, "alpine");
        assert!(request.dockerfile.is_none());
        assert!(request.overwrite_existing);
    }

    #[tokio::test]
    async fn rejects_directory_source_before_any_transport() {
        let source = directory_source();
        let catalog = catalog_for(&source);

        let err = build_import_request(&source, catalog, None, &UploadConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::UnsupportedScheme {
                scheme: Scheme::Directory,
            }
        ));
    }

    #[tokio::test]
    async fn reads_dockerfile_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let dockerfile = dir.path().join("Dockerfile");
        std::fs::write(&dockerfile, b"FROM alpine:3.19\n").unwrap();

        let source = image_source();
        let catalog = catalog_for(&source);

        let request = build_import_request(
            &source,
            catalog,
            None,
            &UploadConfig {
                enabled: true,
                host: "inventory.example.com".to_owned(),
                dockerfile: dockerfile.display().to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(
            request.dockerfile.as_deref(),
            Some(b"FROM alpine:3.19\n".as_slice())
        );
    }

    #[tokio::test]
    async fn missing_dockerfile_is_an_explicit_error() {
        let source = image_source();
        let catalog = catalog_for(&source);

        let err = build_import_request(
            &source,
            catalog,
            None,
            &UploadConfig {
                enabled: true,
                host: "inventory.example.com".to_owned(),
                dockerfile: "/nonexistent/Dockerfile".to_owned(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, UploadError::Dockerfile { .. }));
    }
}
