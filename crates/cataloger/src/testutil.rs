//! 테스트용 인메모리 resolver
//!
//! 실제 소스 없이 cataloger 동작을 검증하기 위한 [`FileResolver`]
//! 구현입니다. 권한 거부 시뮬레이션을 지원합니다.

use std::collections::HashSet;
use std::io::{Cursor, Read};

use globset::{GlobBuilder, GlobSetBuilder};

use drydock_core::types::{FileMetadata, FileType, Location};
use drydock_source::FileResolver;
use drydock_source::error::SourceError;

/// 인메모리 파일 하나
struct MemFile {
    location: Location,
    content: Vec<u8>,
}

/// 인메모리 resolver
#[derive(Default)]
pub(crate) struct MemoryResolver {
    files: Vec<MemFile>,
    denied: HashSet<String>,
}

impl MemoryResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 파일을 추가합니다 (real path == virtual path).
    pub(crate) fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.push(MemFile {
            location: Location::new(path, path),
            content: content.to_vec(),
        });
        self
    }

    /// 콘텐츠 열기 시 권한 거부를 시뮬레이션할 경로를 지정합니다.
    pub(crate) fn with_denied(mut self, path: &str) -> Self {
        self.denied.insert(path.to_owned());
        self
    }

    fn find(&self, location: &Location) -> Result<&MemFile, SourceError> {
        self.files
            .iter()
            .find(|f| f.location == *location)
            .ok_or_else(|| SourceError::NotFound {
                path: location.virtual_path.clone(),
            })
    }
}

impl FileResolver for MemoryResolver {
    fn files_by_glob(&self, patterns: &[String]) -> Result<Vec<Location>, SourceError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern.trim_start_matches('/'))
                .literal_separator(true)
                .build()
                .map_err(|e| SourceError::Glob {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| SourceError::Glob {
            pattern: patterns.join(","),
            reason: e.to_string(),
        })?;

        let mut locations: Vec<Location> = self
            .files
            .iter()
            .filter(|f| set.is_match(f.location.virtual_path.trim_start_matches('/')))
            .map(|f| f.location.clone())
            .collect();
        locations.sort();
        locations.dedup();
        Ok(locations)
    }

    fn file_metadata_by_location(
        &self,
        location: &Location,
    ) -> Result<FileMetadata, SourceError> {
        let file = self.find(location)?;
        Ok(FileMetadata {
            file_type: FileType::Regular,
            size: file.content.len() as u64,
            mode: 0o644,
        })
    }

    fn file_contents_by_location(
        &self,
        location: &Location,
    ) -> Result<Box<dyn Read + Send>, SourceError> {
        if self.denied.contains(&location.virtual_path) {
            return Err(SourceError::PermissionDenied {
                path: location.virtual_path.clone(),
            });
        }
        let file = self.find(location)?;
        Ok(Box::new(Cursor::new(file.content.clone())))
    }
}
