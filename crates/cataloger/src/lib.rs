#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 (`CatalogError`)
//! - [`cataloger`]: 추출 계약과 실행기 (`Cataloger`, `catalog_source`)
//! - [`contents`]: 콘텐츠 cataloger (`ContentsCataloger`)
//! - [`digests`]: 다이제스트 cataloger (`DigestsCataloger`)
//! - [`distro`]: 배포판 탐지 (`identify_distro`)

pub mod cataloger;
pub mod contents;
pub mod digests;
pub mod distro;
pub mod error;

#[cfg(test)]
pub(crate) mod testutil;

// --- Public API Re-exports ---

pub use cataloger::{Cataloger, catalog_source};
pub use contents::ContentsCataloger;
pub use digests::DigestsCataloger;
pub use distro::identify_distro;
pub use error::CatalogError;
