#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 (`SourceError`)
//! - [`scheme`]: 입력 스킴 파싱/추론 (`parse_scheme`, `SchemeHint`)
//! - [`source`]: 열린 소스의 소유자 (`Source`)
//! - [`resolver`]: 읽기 전용 파일 접근 계약 (`FileResolver`)
//! - [`directory`]: 디렉토리 resolver
//! - [`image`]: 이미지 아카이브/레이아웃 해석과 스코프별 resolver
//! - `layer`: 레이어 tar 추출 (whiteout 처리)
//! - [`daemon`]: Docker daemon 추상화 (`ImageDaemon`, bollard 구현)

pub mod daemon;
pub mod directory;
pub mod error;
pub mod image;
pub(crate) mod layer;
pub mod resolver;
pub mod scheme;
pub mod source;

// --- Public API Re-exports ---

// Source
pub use source::Source;

// Resolver 계약
pub use resolver::FileResolver;
pub use directory::DirectoryResolver;
pub use image::{AllLayersImageResolver, SquashedImageResolver};

// 스킴
pub use scheme::{SchemeHint, parse_scheme};

// Daemon
pub use daemon::{BollardImageDaemon, ImageDaemon};

// 에러
pub use error::SourceError;
