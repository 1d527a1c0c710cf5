#![doc = include_str!("../README.md")]

pub mod bus;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{
    CatalogFault, CodecError, ConfigError, DrydockError, PipelineFault, SourceFault,
};

// 설정
pub use config::DrydockConfig;

// 이벤트 / 버스
pub use bus::EventBus;
pub use event::{CatalogReadyEvent, Event, EventMetadata};

// 도메인 타입
pub use types::{
    DirectoryMetadata, Distro, FileMetadata, FileType, ImageMetadata, LayerMetadata, Location,
    Scheme, Scope, SourceMetadata,
};

// 카탈로그
pub use catalog::{Artifact, Catalog, CatalogEntry, DigestAlgorithm, FileDigest};
