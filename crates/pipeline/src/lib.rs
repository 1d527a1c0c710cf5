#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 (`PipelineError`, `UploadError`)
//! - [`orchestrator`]: 파이프라인 실행 (`CatalogPipeline`, 빌더)
//! - [`upload`]: 업로드 페이로드 조립 (`ImportRequest`, `ImportClient`)

pub mod error;
pub mod orchestrator;
pub mod upload;

// --- Public API Re-exports ---

pub use error::{PipelineError, UploadError};
pub use orchestrator::{CatalogPipeline, CatalogPipelineBuilder};
pub use upload::{ImportClient, ImportRequest, build_import_request};
