//! Source -- 열린 콘텐츠 루트의 소유자
//!
//! [`Source`]는 해석이 끝난 콘텐츠 루트(추출된 이미지 또는 디렉토리)와
//! 자기 자신을 기술하는 [`SourceMetadata`], 그리고 임시 추출 영역을
//! 소유합니다. 임시 영역은 `TempDir`의 RAII로 관리되어 성공/실패/취소
//! 어느 경로로 끝나든 정확히 한 번 해제됩니다. Source 외의 어떤
//! 컴포넌트도 이 자원을 닫거나 지우지 않습니다.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tempfile::TempDir;
use tracing::{debug, info};

use drydock_core::metrics::{LABEL_SCHEME, SOURCE_OPEN_DURATION_SECONDS};
use drydock_core::types::{DirectoryMetadata, Scheme, Scope, SourceMetadata};

use crate::daemon::ImageDaemon;
use crate::directory::DirectoryResolver;
use crate::error::SourceError;
use crate::image::OpenedImage;
use crate::resolver::FileResolver;
use crate::scheme::{DetectedSource, detect};

/// 열린 소스의 내부 표현
enum SourceInner {
    /// 일반 디렉토리
    Directory { root: PathBuf },
    /// 추출이 끝난 이미지
    Image { image: OpenedImage },
}

/// 열린 콘텐츠 소스
///
/// 요청된 [`Scope`]마다 정확히 하나의 [`FileResolver`]를 제공합니다.
/// 지원하지 않는 스코프는 명시적 에러로 거부하며, 다른 스코프로
/// 조용히 대체하지 않습니다.
pub struct Source {
    metadata: SourceMetadata,
    inner: SourceInner,
    /// 이미지 추출 임시 영역 (디렉토리 소스는 None)
    workspace: Option<TempDir>,
}

impl Source {
    /// 사용자 입력을 해석하여 소스를 엽니다 (daemon 접근 없음).
    ///
    /// daemon export가 필요한 입력(`docker:` 또는 디스크에 없는 이미지
    /// 참조)은 [`Source::open_with_daemon`]을 사용해야 합니다.
    pub async fn open(user_input: &str) -> Result<Self, SourceError> {
        match detect(user_input)? {
            DetectedSource::DaemonImage(reference) => Err(SourceError::Daemon(format!(
                "resolving '{reference}' requires a docker daemon client"
            ))),
            detected => Self::open_detected(detected, user_input).await,
        }
    }

    /// 사용자 입력을 해석하여 소스를 엽니다 (daemon 지원 포함).
    pub async fn open_with_daemon<D: ImageDaemon>(
        user_input: &str,
        daemon: &D,
    ) -> Result<Self, SourceError> {
        match detect(user_input)? {
            DetectedSource::DaemonImage(reference) => {
                let workspace = TempDir::new()
                    .map_err(|e| SourceError::from_io("daemon workspace", e))?;
                let tar_path = workspace.path().join("daemon-export.tar");
                daemon.export_image(&reference, &tar_path).await?;

                Self::open_image(workspace, user_input, move |ws, input| {
                    OpenedImage::open_docker_archive(&tar_path, ws, input)
                })
                .await
            }
            detected => Self::open_detected(detected, user_input).await,
        }
    }

    async fn open_detected(
        detected: DetectedSource,
        user_input: &str,
    ) -> Result<Self, SourceError> {
        let started = Instant::now();
        let source = match detected {
            DetectedSource::Directory(path) => {
                let root = std::fs::canonicalize(&path)
                    .map_err(|e| SourceError::from_io(path.to_string_lossy(), e))?;
                info!(path = %root.display(), "directory source opened");
                Self {
                    metadata: SourceMetadata::Directory(DirectoryMetadata {
                        path: root.display().to_string(),
                    }),
                    inner: SourceInner::Directory { root },
                    workspace: None,
                }
            }
            DetectedSource::DockerArchive(tar_path) => {
                let workspace = TempDir::new()
                    .map_err(|e| SourceError::from_io("archive workspace", e))?;
                Self::open_image(workspace, user_input, move |ws, input| {
                    OpenedImage::open_docker_archive(&tar_path, ws, input)
                })
                .await?
            }
            DetectedSource::OciArchive(tar_path) => {
                let workspace = TempDir::new()
                    .map_err(|e| SourceError::from_io("archive workspace", e))?;
                Self::open_image(workspace, user_input, move |ws, input| {
                    OpenedImage::open_oci_archive(&tar_path, ws, input)
                })
                .await?
            }
            DetectedSource::OciDir(layout_dir) => {
                let workspace = TempDir::new()
                    .map_err(|e| SourceError::from_io("layout workspace", e))?;
                Self::open_image(workspace, user_input, move |ws, input| {
                    OpenedImage::open_oci_layout(&layout_dir, ws, input)
                })
                .await?
            }
            DetectedSource::DaemonImage(reference) => {
                return Err(SourceError::Daemon(format!(
                    "resolving '{reference}' requires a docker daemon client"
                )));
            }
        };

        metrics::histogram!(
            SOURCE_OPEN_DURATION_SECONDS,
            LABEL_SCHEME => source.metadata.scheme().to_string(),
        )
        .record(started.elapsed().as_secs_f64());

        Ok(source)
    }

    /// 이미지 열기의 블로킹 부분을 spawn_blocking으로 수행합니다.
    async fn open_image<F>(
        workspace: TempDir,
        user_input: &str,
        open: F,
    ) -> Result<Self, SourceError>
    where
        F: FnOnce(&Path, &str) -> Result<OpenedImage, SourceError> + Send + 'static,
    {
        let workspace_path = workspace.path().to_path_buf();
        let input = user_input.to_owned();

        let image = tokio::task::spawn_blocking(move || open(&workspace_path, &input))
            .await
            .map_err(|e| SourceError::Internal(format!("spawn_blocking failed: {e}")))??;

        debug!(
            repository = %image.metadata.repository,
            layers = image.metadata.layers.len(),
            "image source opened"
        );

        Ok(Self {
            metadata: SourceMetadata::Image(image.metadata.clone()),
            inner: SourceInner::Image { image },
            workspace: Some(workspace),
        })
    }

    /// 이 소스를 기술하는 메타데이터를 반환합니다.
    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    /// 소스 스킴을 반환합니다.
    pub fn scheme(&self) -> Scheme {
        self.metadata.scheme()
    }

    /// 요청된 스코프에 결속된 resolver를 반환합니다.
    ///
    /// # Errors
    ///
    /// 디렉토리 소스에 `AllLayers`를 요청하는 등 소스 종류가 지원하지
    /// 않는 스코프는 `SourceError::UnsupportedScope`로 거부됩니다.
    pub fn file_resolver(&self, scope: Scope) -> Result<Box<dyn FileResolver>, SourceError> {
        match &self.inner {
            SourceInner::Directory { root } => match scope {
                Scope::Squashed => Ok(Box::new(DirectoryResolver::new(root.clone()))),
                Scope::AllLayers => Err(SourceError::UnsupportedScope {
                    scheme: Scheme::Directory,
                    scope,
                }),
            },
            SourceInner::Image { image } => match scope {
                Scope::Squashed => Ok(Box::new(image.squashed_resolver())),
                Scope::AllLayers => Ok(Box::new(image.all_layers_resolver())),
            },
        }
    }

    /// 임시 추출 영역의 경로를 반환합니다 (이미지 소스만, 테스트/진단용).
    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace.as_ref().map(|w| w.path())
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("metadata", &self.metadata)
            .field("workspace", &self.workspace.as_ref().map(TempDir::path))
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for dyn FileResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn FileResolver")
    }
}
