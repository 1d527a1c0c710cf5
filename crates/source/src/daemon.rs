//! Docker daemon 추상화
//!
//! [`ImageDaemon`] trait이 bollard Docker API를 감싸 프로덕션 코드는
//! [`BollardImageDaemon`]을, 테스트는 mock을 사용할 수 있게 합니다.
//! 이 시스템이 daemon에 요구하는 것은 이미지 tar export 하나뿐입니다.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::SourceError;

/// Docker daemon 작업 추상화 trait
///
/// `Send + Sync + 'static` 바운드로 async 컨텍스트 간 안전한 공유를
/// 보장합니다. export는 네트워크/소켓 I/O로 블로킹될 수 있으며,
/// 호출자의 취소 신호와 select로 경합시킬 수 있습니다.
pub trait ImageDaemon: Send + Sync + 'static {
    /// daemon 연결 상태를 확인합니다.
    fn ping(&self) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// 이미지 참조를 `docker save` 형식의 tar로 `dest`에 내려받습니다.
    fn export_image(
        &self,
        reference: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;
}

/// bollard 기반 프로덕션 구현
///
/// Unix 소켓 또는 TCP로 Docker daemon과 통신합니다. 내부적으로
/// `Arc<bollard::Docker>`를 사용해 async task 간 안전하게 공유됩니다.
pub struct BollardImageDaemon {
    docker: Arc<bollard::Docker>,
}

impl BollardImageDaemon {
    /// 플랫폼 기본 로컬 소켓으로 연결합니다.
    ///
    /// # Errors
    ///
    /// 소켓을 찾을 수 없거나 권한이 없으면 `SourceError::Daemon`을
    /// 반환합니다.
    pub fn connect_local() -> Result<Self, SourceError> {
        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|e| SourceError::Daemon(format!("failed to connect to docker: {e}")))?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// 지정한 소켓 경로로 연결합니다.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, SourceError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    SourceError::Daemon(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }
}

impl ImageDaemon for BollardImageDaemon {
    async fn ping(&self) -> Result<(), SourceError> {
        self.docker
            .ping()
            .await
            .map_err(|e| SourceError::Daemon(format!("ping failed: {e}")))?;
        Ok(())
    }

    async fn export_image(&self, reference: &str, dest: &Path) -> Result<(), SourceError> {
        info!(reference, "exporting image from docker daemon");

        let mut stream = self.docker.export_image(reference);
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| SourceError::from_io(dest.to_string_lossy(), e))?;

        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                SourceError::Daemon(format!("export failed for '{reference}': {e}"))
            })?;
            written += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(|e| SourceError::from_io(dest.to_string_lossy(), e))?;
        }
        file.flush()
            .await
            .map_err(|e| SourceError::from_io(dest.to_string_lossy(), e))?;

        debug!(reference, bytes = written, "image export complete");
        Ok(())
    }
}

/// 테스트용 mock daemon
///
/// 미리 준비한 tar 픽스처를 export 결과로 복사합니다.
#[cfg(test)]
pub struct MockImageDaemon {
    /// export 시 복사할 픽스처 경로
    pub fixture: std::path::PathBuf,
    /// ping/export 실패를 시뮬레이션할지 여부
    pub fail: bool,
}

#[cfg(test)]
impl MockImageDaemon {
    /// 픽스처를 export 결과로 돌려주는 mock을 생성합니다.
    pub fn with_fixture(fixture: impl Into<std::path::PathBuf>) -> Self {
        Self {
            fixture: fixture.into(),
            fail: false,
        }
    }

    /// 모든 호출이 실패하는 mock을 생성합니다.
    pub fn failing() -> Self {
        Self {
            fixture: std::path::PathBuf::new(),
            fail: true,
        }
    }
}

#[cfg(test)]
impl ImageDaemon for MockImageDaemon {
    async fn ping(&self) -> Result<(), SourceError> {
        if self.fail {
            return Err(SourceError::Daemon("mock daemon unreachable".to_owned()));
        }
        Ok(())
    }

    async fn export_image(&self, reference: &str, dest: &Path) -> Result<(), SourceError> {
        if self.fail {
            return Err(SourceError::Daemon(format!(
                "mock export failed for '{reference}'"
            )));
        }
        tokio::fs::copy(&self.fixture, dest)
            .await
            .map_err(|e| SourceError::from_io(dest.to_string_lossy(), e))?;
        Ok(())
    }
}
