//! 파이프라인 오케스트레이션 -- 소스 해석/카탈로깅/결과 전달
//!
//! 한 번의 실행은 하나의 tokio task입니다. 시작한 호출자는 단발성
//! 완료 채널(값은 최대 하나, 이후 닫힘)로 결과를 받고, 프레젠테이션/
//! 업로드 협력자는 이벤트 버스로 [`CatalogReadyEvent`]를 받습니다.
//!
//! # 상태 기계
//!
//! ```text
//! Idle -> SourceResolving -> Cataloging -> (UploadPending ->) Publishing -> Done
//!   |          |                |               |                 |
//!   +----------+----------------+---------------+-----------------+--> Failed
//! ```
//!
//! 첫 치명 에러에서 `Failed`로 전이하며, `Failed`/`Done` 모두 채널
//! 닫힘으로 끝납니다. 취소 시에도 소스의 임시 자원은 RAII로 정확히
//! 한 번 해제됩니다.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use drydock_cataloger::{Cataloger, ContentsCataloger, DigestsCataloger, catalog_source, identify_distro};
use drydock_core::catalog::Catalog;
use drydock_core::config::DrydockConfig;
use drydock_core::error::DrydockError;
use drydock_core::event::CatalogReadyEvent;
use drydock_core::metrics::{
    LABEL_RESULT, PIPELINE_DURATION_SECONDS, PIPELINE_FAILURES_TOTAL, PIPELINE_RUNS_TOTAL,
    UPLOAD_ATTEMPTS_TOTAL,
};
use drydock_core::types::Distro;
use drydock_core::EventBus;
use drydock_source::{ImageDaemon, Source};

use crate::error::PipelineError;
use crate::upload::{ImportClient, build_import_request};

/// 파이프라인 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    /// 아직 시작하지 않음
    Idle,
    /// 소스 해석 중
    SourceResolving,
    /// cataloger 실행 중
    Cataloging,
    /// 업로드 대기/진행 중
    UploadPending,
    /// 이벤트 발행 중
    Publishing,
    /// 정상 종료
    Done,
    /// 치명 에러로 종료
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::SourceResolving => "source-resolving",
            Self::Cataloging => "cataloging",
            Self::UploadPending => "upload-pending",
            Self::Publishing => "publishing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    debug!(from = %state, to = %next, "pipeline state transition");
    *state = next;
}

/// 카탈로그 파이프라인
///
/// [`CatalogPipelineBuilder`]로 조립한 뒤 [`CatalogPipeline::run`]으로
/// 실행합니다. 실행은 소비형(consuming)이며 파이프라인 인스턴스당 한 번입니다.
pub struct CatalogPipeline<D: ImageDaemon> {
    config: DrydockConfig,
    catalogers: Arc<Vec<Box<dyn Cataloger>>>,
    bus: EventBus,
    daemon: D,
    importer: Option<Arc<dyn ImportClient>>,
    cancel: CancellationToken,
}

impl<D: ImageDaemon> fmt::Debug for CatalogPipeline<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogPipeline")
            .field("config", &self.config)
            .field("catalogers", &self.catalogers.len())
            .field("importer", &self.importer.is_some())
            .finish_non_exhaustive()
    }
}

impl<D: ImageDaemon> CatalogPipeline<D> {
    /// 파이프라인을 백그라운드 작업으로 시작합니다.
    ///
    /// 반환된 채널은 최대 하나의 터미널 에러를 전달한 뒤 닫히며,
    /// 성공 시에는 값 없이 닫힙니다. 채널 닫힘이 곧 완료 신호입니다.
    pub fn run(self, user_input: impl Into<String>) -> mpsc::Receiver<DrydockError> {
        let (err_tx, err_rx) = mpsc::channel(1);
        let user_input = user_input.into();

        tokio::spawn(async move {
            metrics::counter!(PIPELINE_RUNS_TOTAL).increment(1);
            let started = Instant::now();

            if let Err(e) = self.execute(&user_input).await {
                debug!(to = %PipelineState::Failed, "pipeline state transition");
                metrics::counter!(PIPELINE_FAILURES_TOTAL).increment(1);

                let err: DrydockError = e.into();
                warn!(error = %err, input = %user_input, "catalog pipeline failed");
                // 소비자가 먼저 떠났더라도 실패는 아니다
                let _ = err_tx.send(err).await;
            }

            metrics::histogram!(PIPELINE_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
            // err_tx drop -> 채널 닫힘 -> 완료 신호
        });

        err_rx
    }

    async fn execute(&self, user_input: &str) -> Result<(), PipelineError> {
        let mut state = PipelineState::Idle;

        let scope = self
            .config
            .scope_selection()
            .map_err(|e| PipelineError::Init(e.to_string()))?;

        transition(&mut state, PipelineState::SourceResolving);
        let source = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = Source::open_with_daemon(user_input, &self.daemon) => result?,
        };
        let source = Arc::new(source);

        transition(&mut state, PipelineState::Cataloging);
        let src = Arc::clone(&source);
        let catalogers = Arc::clone(&self.catalogers);
        let cataloging = tokio::task::spawn_blocking(
            move || -> Result<(Catalog, Option<Distro>), PipelineError> {
                let resolver = src.file_resolver(scope)?;
                let catalog = catalog_source(
                    src.metadata().clone(),
                    scope,
                    resolver.as_ref(),
                    catalogers.as_slice(),
                )?;
                let distro = identify_distro(resolver.as_ref());
                Ok((catalog, distro))
            },
        );
        let (catalog, distro) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
            joined = cataloging => joined
                .map_err(|e| PipelineError::Init(format!("cataloging task failed: {e}")))??,
        };
        let catalog = Arc::new(catalog);

        if self.config.upload.enabled {
            transition(&mut state, PipelineState::UploadPending);
            let request = build_import_request(
                source.metadata(),
                Arc::clone(&catalog),
                distro.clone(),
                &self.config.upload,
            )
            .await?;

            let Some(importer) = self.importer.as_ref() else {
                return Err(PipelineError::Init(
                    "upload enabled but no import client configured".to_owned(),
                ));
            };

            info!(host = %self.config.upload.host, "uploading catalog to inventory service");
            let upload_result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                result = importer.import(&request) => result,
            };
            match upload_result {
                Ok(()) => {
                    metrics::counter!(UPLOAD_ATTEMPTS_TOTAL, LABEL_RESULT => "success")
                        .increment(1);
                }
                Err(e) => {
                    metrics::counter!(UPLOAD_ATTEMPTS_TOTAL, LABEL_RESULT => "failure")
                        .increment(1);
                    return Err(e.into());
                }
            }
        }

        transition(&mut state, PipelineState::Publishing);
        let event = CatalogReadyEvent::new(source.metadata().clone(), Arc::clone(&catalog), distro);
        let receivers = self.bus.publish(event);

        transition(&mut state, PipelineState::Done);
        info!(
            locations = catalog.entry_count(),
            artifacts = catalog.artifact_count(),
            scheme = %source.metadata().scheme(),
            receivers,
            "catalog pipeline completed"
        );
        Ok(())
    }
}

/// 카탈로그 파이프라인 빌더
///
/// cataloger를 지정하지 않으면 설정에서 활성화된 기본 cataloger
/// (콘텐츠, 다이제스트)를 구성합니다.
pub struct CatalogPipelineBuilder<D: ImageDaemon> {
    config: DrydockConfig,
    catalogers: Vec<Box<dyn Cataloger>>,
    bus: Option<EventBus>,
    daemon: D,
    importer: Option<Arc<dyn ImportClient>>,
    cancel: CancellationToken,
}

impl<D: ImageDaemon> CatalogPipelineBuilder<D> {
    /// daemon 클라이언트와 기본 설정으로 빌더를 생성합니다.
    pub fn new(daemon: D) -> Self {
        Self {
            config: DrydockConfig::default(),
            catalogers: Vec::new(),
            bus: None,
            daemon,
            importer: None,
            cancel: CancellationToken::new(),
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: DrydockConfig) -> Self {
        self.config = config;
        self
    }

    /// cataloger를 추가합니다 (지정하면 기본 구성을 대체).
    pub fn cataloger(mut self, cataloger: Box<dyn Cataloger>) -> Self {
        self.catalogers.push(cataloger);
        self
    }

    /// 외부 이벤트 버스를 사용합니다.
    ///
    /// 지정하지 않으면 빌더가 새 버스를 생성합니다.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// 업로드 전송 클라이언트를 지정합니다.
    pub fn import_client(mut self, client: Arc<dyn ImportClient>) -> Self {
        self.importer = Some(client);
        self
    }

    /// 외부 취소 토큰을 연결합니다.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Returns
    ///
    /// - `CatalogPipeline`: 실행 준비가 끝난 파이프라인
    /// - `EventBus`: 협력자가 구독할 버스 (외부 버스를 지정했다면 그 clone)
    ///
    /// # Errors
    ///
    /// 설정 검증 실패, 또는 업로드가 활성화되었는데 import 클라이언트가
    /// 없으면 `PipelineError::Init`을 반환합니다.
    pub fn build(mut self) -> Result<(CatalogPipeline<D>, EventBus), PipelineError> {
        self.config
            .validate()
            .map_err(|e| PipelineError::Init(e.to_string()))?;

        if self.config.upload.enabled && self.importer.is_none() {
            return Err(PipelineError::Init(
                "upload enabled but no import client configured".to_owned(),
            ));
        }

        if self.catalogers.is_empty() {
            self.catalogers = default_catalogers(&self.config)?;
        }

        let bus = self.bus.unwrap_or_default();
        let pipeline = CatalogPipeline {
            config: self.config,
            catalogers: Arc::new(self.catalogers),
            bus: bus.clone(),
            daemon: self.daemon,
            importer: self.importer,
            cancel: self.cancel,
        };

        Ok((pipeline, bus))
    }
}

/// 설정에서 활성화된 기본 cataloger 목록을 구성합니다.
fn default_catalogers(
    config: &DrydockConfig,
) -> Result<Vec<Box<dyn Cataloger>>, PipelineError> {
    let mut catalogers: Vec<Box<dyn Cataloger>> = Vec::new();

    if config.contents.enabled {
        catalogers.push(Box::new(ContentsCataloger::new(
            config.contents.globs.clone(),
            config.contents.skip_files_above_size,
        )));
    }

    if config.digests.enabled {
        let algorithms = config
            .digest_algorithms()
            .map_err(|e| PipelineError::Init(e.to_string()))?;
        catalogers.push(Box::new(DigestsCataloger::new(
            config.digests.globs.clone(),
            algorithms,
        )));
    }

    Ok(catalogers)
}
