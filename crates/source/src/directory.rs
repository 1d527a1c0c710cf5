//! 디렉토리 소스 resolver
//!
//! 일반 디렉토리 트리를 루트로 하는 [`FileResolver`] 구현입니다.
//! virtual path는 루트 기준 상대 경로, real path는 실제 파일시스템
//! 경로입니다.

use std::fs::File;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use drydock_core::types::{FileMetadata, FileType, Location};

use crate::error::SourceError;
use crate::resolver::{FileResolver, build_globset, glob_matches};

/// 디렉토리 트리에 대한 resolver
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    /// 지정한 루트에 대한 resolver를 생성합니다.
    ///
    /// 일반적으로 [`Source::file_resolver`](crate::Source::file_resolver)를
    /// 통해 얻지만, 디렉토리 트리만 다룰 때는 직접 생성할 수 있습니다.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// real path가 이 resolver의 루트에 속하는지 확인합니다.
    fn ensure_within_root(&self, location: &Location) -> Result<(), SourceError> {
        if Path::new(&location.real_path).starts_with(&self.root) {
            Ok(())
        } else {
            Err(SourceError::NotFound {
                path: location.real_path.clone(),
            })
        }
    }
}

fn file_type_of(metadata: &std::fs::Metadata) -> FileType {
    let ft = metadata.file_type();
    if ft.is_file() {
        FileType::Regular
    } else if ft.is_dir() {
        FileType::Directory
    } else if ft.is_symlink() {
        FileType::Symlink
    } else {
        FileType::Other
    }
}

impl FileResolver for DirectoryResolver {
    fn files_by_glob(&self, patterns: &[String]) -> Result<Vec<Location>, SourceError> {
        let set = build_globset(patterns)?;
        let mut locations = std::collections::BTreeSet::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    // 읽을 수 없는 하위 경로는 파일 단위 조건으로 취급한다
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            let file_type = entry.file_type();
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }

            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let virtual_path = relative.to_string_lossy().to_string();
            if virtual_path.is_empty() || !glob_matches(&set, &virtual_path) {
                continue;
            }

            locations.insert(Location::new(
                entry.path().to_string_lossy().to_string(),
                virtual_path,
            ));
        }

        Ok(locations.into_iter().collect())
    }

    fn file_metadata_by_location(
        &self,
        location: &Location,
    ) -> Result<FileMetadata, SourceError> {
        self.ensure_within_root(location)?;

        let metadata = std::fs::symlink_metadata(&location.real_path)
            .map_err(|e| SourceError::from_io(&location.real_path, e))?;

        Ok(FileMetadata {
            file_type: file_type_of(&metadata),
            size: metadata.len(),
            mode: metadata.permissions().mode() & 0o7777,
        })
    }

    fn file_contents_by_location(
        &self,
        location: &Location,
    ) -> Result<Box<dyn Read + Send>, SourceError> {
        self.ensure_within_root(location)?;

        let file = File::open(&location.real_path)
            .map_err(|e| SourceError::from_io(&location.real_path, e))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture_tree() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/sub")).unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("docs/guide.txt"), b"guide contents").unwrap();
        std::fs::write(dir.path().join("docs/sub/deep.txt"), b"deep").unwrap();
        std::fs::write(dir.path().join("app.log"), b"log line").unwrap();
        dir
    }

    #[test]
    fn files_by_glob_matches_recursively() {
        let dir = fixture_tree();
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());

        let locations = resolver
            .files_by_glob(&["**/*.txt".to_owned()])
            .unwrap();

        let virtuals: Vec<&str> = locations.iter().map(|l| l.virtual_path.as_str()).collect();
        assert_eq!(locations.len(), 3);
        assert!(virtuals.contains(&"readme.txt"));
        assert!(virtuals.contains(&"docs/guide.txt"));
        assert!(virtuals.contains(&"docs/sub/deep.txt"));
    }

    #[test]
    fn files_by_glob_empty_result_is_ok() {
        let dir = fixture_tree();
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());

        let locations = resolver.files_by_glob(&["**/*.rs".to_owned()]).unwrap();
        assert!(locations.is_empty());
    }

    #[test]
    fn files_by_glob_collapses_duplicate_matches() {
        let dir = fixture_tree();
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());

        // 두 패턴이 같은 파일에 매칭되어도 Location은 한 번만 나타난다
        let locations = resolver
            .files_by_glob(&["**/*.txt".to_owned(), "readme.*".to_owned()])
            .unwrap();
        let readme_count = locations
            .iter()
            .filter(|l| l.virtual_path == "readme.txt")
            .count();
        assert_eq!(readme_count, 1);
    }

    #[test]
    fn file_metadata_reports_size_and_type() {
        let dir = fixture_tree();
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());

        let locations = resolver.files_by_glob(&["readme.txt".to_owned()]).unwrap();
        let metadata = resolver
            .file_metadata_by_location(&locations[0])
            .unwrap();

        assert_eq!(metadata.file_type, FileType::Regular);
        assert_eq!(metadata.size, 5);
    }

    #[test]
    fn file_metadata_unknown_location_is_not_found() {
        let dir = fixture_tree();
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());

        let bogus = Location::new(
            dir.path().join("missing.txt").to_string_lossy().to_string(),
            "missing.txt",
        );
        let err = resolver.file_metadata_by_location(&bogus).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn file_metadata_outside_root_is_not_found() {
        let dir = fixture_tree();
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());

        let outside = Location::new("/etc/hostname", "hostname");
        let err = resolver.file_metadata_by_location(&outside).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn file_contents_streams_from_offset_zero() {
        let dir = fixture_tree();
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());

        let locations = resolver
            .files_by_glob(&["docs/guide.txt".to_owned()])
            .unwrap();
        let mut reader = resolver
            .file_contents_by_location(&locations[0])
            .unwrap();

        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        assert_eq!(content, "guide contents");
    }

    #[test]
    fn symlinks_are_reported_with_symlink_type() {
        let dir = fixture_tree();
        std::os::unix::fs::symlink(
            dir.path().join("readme.txt"),
            dir.path().join("link.txt"),
        )
        .unwrap();
        let resolver = DirectoryResolver::new(dir.path().to_path_buf());

        let locations = resolver.files_by_glob(&["link.txt".to_owned()]).unwrap();
        assert_eq!(locations.len(), 1);

        let metadata = resolver
            .file_metadata_by_location(&locations[0])
            .unwrap();
        assert_eq!(metadata.file_type, FileType::Symlink);

        // 콘텐츠는 링크 대상을 따라간다
        let mut reader = resolver
            .file_contents_by_location(&locations[0])
            .unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn mode_bits_are_reported() {
        let dir = fixture_tree();
        let path = dir.path().join("script.sh");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"#!/bin/sh\n").unwrap();
        drop(file);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let resolver = DirectoryResolver::new(dir.path().to_path_buf());
        let locations = resolver.files_by_glob(&["script.sh".to_owned()]).unwrap();
        let metadata = resolver
            .file_metadata_by_location(&locations[0])
            .unwrap();
        assert_eq!(metadata.mode, 0o755);
    }
}
