//! 이벤트 시스템 — 파이프라인과 협력자 간 통신의 기본 단위
//!
//! 파이프라인의 완료 채널과 별개로, 프레젠테이션/업로드 협력자는
//! [`crate::bus::EventBus`]를 통해 이벤트로 결과를 전달받습니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 추적 정보이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::catalog::Catalog;
use crate::types::{Distro, SourceMetadata};

// --- 모듈명 상수 ---

/// 소스 모듈명
pub const MODULE_SOURCE: &str = "source";
/// cataloger 모듈명
pub const MODULE_CATALOGER: &str = "cataloger";
/// 파이프라인 모듈명
pub const MODULE_PIPELINE: &str = "pipeline";

// --- 이벤트 타입 상수 ---

/// 카탈로그 완료 이벤트 타입
pub const EVENT_TYPE_CATALOG_READY: &str = "catalog-ready";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
#[derive(Debug, Clone)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 추적 ID — 같은 실행의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self
            .timestamp
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        write!(
            f,
            "[{}] source={} trace={}",
            secs, self.source_module, self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 tokio 채널을 통한 안전한 전송을
/// 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 카탈로그 완료 이벤트
///
/// 파이프라인이 성공적으로 끝났을 때 정확히 한 번 발행됩니다.
/// 소스 메타데이터, 완성된 카탈로그, 탐지된 배포판 정보를 싣습니다.
/// 카탈로그는 `Arc`로 공유되어 구독자 수와 무관하게 복사 비용이 없습니다.
#[derive(Debug, Clone)]
pub struct CatalogReadyEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 스캔 대상 소스의 메타데이터
    pub source: SourceMetadata,
    /// 완성된 카탈로그
    pub catalog: Arc<Catalog>,
    /// 탐지된 배포판 (있을 경우)
    pub distro: Option<Distro>,
}

impl CatalogReadyEvent {
    /// 새로운 trace를 시작하는 카탈로그 완료 이벤트를 생성합니다.
    pub fn new(source: SourceMetadata, catalog: Arc<Catalog>, distro: Option<Distro>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_PIPELINE),
            source,
            catalog,
            distro,
        }
    }

    /// 기존 trace에 연결된 이벤트를 생성합니다.
    pub fn with_trace(
        source: SourceMetadata,
        catalog: Arc<Catalog>,
        distro: Option<Distro>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_PIPELINE, trace_id),
            source,
            catalog,
            distro,
        }
    }
}

impl Event for CatalogReadyEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_CATALOG_READY
    }
}

impl fmt::Display for CatalogReadyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CatalogReadyEvent[{}] source={} locations={} distro={}",
            &self.id[..8.min(self.id.len())],
            self.source,
            self.catalog.entry_count(),
            self.distro
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown".to_owned()),
        )
    }
}
