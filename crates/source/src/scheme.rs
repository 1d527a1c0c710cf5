//! 입력 스킴 파싱 및 추론
//!
//! 사용자 입력 문자열에서 스킴 접두어(`docker:`, `docker-archive:`,
//! `oci-archive:`, `oci-dir:`, `dir:`)를 파싱하고, 접두어가 없으면
//! 디스크 존재 여부를 probing하여 소스 종류를 추론합니다. probing
//! 실패 시에는 daemon 이미지 참조로 간주하며, 그마저 불가능한 입력은
//! unresolvable 에러입니다.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SourceError;
use crate::layer::open_maybe_gzip;

/// 입력에 명시된 스킴 힌트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeHint {
    /// `docker:` — daemon에서 이미지 export
    Docker,
    /// `docker-archive:` — `docker save` tar
    DockerArchive,
    /// `oci-archive:` — OCI 레이아웃 tar
    OciArchive,
    /// `oci-dir:` — OCI 레이아웃 디렉토리
    OciDir,
    /// `dir:` — 일반 디렉토리
    Dir,
    /// 접두어 없음 — probing으로 추론
    Auto,
}

/// 추론이 끝난 구체적 소스 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DetectedSource {
    /// 일반 디렉토리
    Directory(PathBuf),
    /// docker save 아카이브
    DockerArchive(PathBuf),
    /// OCI 아카이브
    OciArchive(PathBuf),
    /// OCI 레이아웃 디렉토리
    OciDir(PathBuf),
    /// daemon에서 export할 이미지 참조
    DaemonImage(String),
}

/// 입력에서 스킴 접두어를 분리합니다.
pub fn parse_scheme(user_input: &str) -> (SchemeHint, &str) {
    // 긴 접두어 먼저 — `docker-archive:`가 `docker:`에 먹히지 않도록
    const PREFIXES: &[(&str, SchemeHint)] = &[
        ("docker-archive:", SchemeHint::DockerArchive),
        ("oci-archive:", SchemeHint::OciArchive),
        ("oci-dir:", SchemeHint::OciDir),
        ("docker:", SchemeHint::Docker),
        ("dir:", SchemeHint::Dir),
    ];

    for (prefix, hint) in PREFIXES {
        if let Some(rest) = user_input.strip_prefix(prefix) {
            return (*hint, rest);
        }
    }
    (SchemeHint::Auto, user_input)
}

/// 아카이브 파일의 종류를 헤더 스캔으로 판별합니다.
fn peek_archive(path: &Path) -> Result<Option<DetectedSource>, SourceError> {
    let reader = open_maybe_gzip(path)?;
    let mut archive = tar::Archive::new(reader);

    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(_) => return Ok(None), // tar가 아니면 아카이브 소스가 아니다
    };

    for entry in entries {
        let Ok(entry) = entry else {
            return Ok(None);
        };
        let Ok(entry_path) = entry.path() else {
            continue;
        };
        let name = entry_path.to_string_lossy();
        let name = name.trim_start_matches("./");
        if name == "manifest.json" {
            return Ok(Some(DetectedSource::DockerArchive(path.to_path_buf())));
        }
        if name == "oci-layout" {
            return Ok(Some(DetectedSource::OciArchive(path.to_path_buf())));
        }
    }
    Ok(None)
}

/// 이미지 참조로 쓸 수 있는 형태인지 대략 확인합니다.
fn looks_like_image_reference(input: &str) -> bool {
    !input.is_empty()
        && !input.contains(char::is_whitespace)
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@".contains(c))
}

/// 사용자 입력을 구체적인 소스 종류로 해석합니다.
pub(crate) fn detect(user_input: &str) -> Result<DetectedSource, SourceError> {
    let (hint, rest) = parse_scheme(user_input);
    if rest.is_empty() {
        return Err(SourceError::Unresolvable {
            input: user_input.to_owned(),
        });
    }

    let detected = match hint {
        SchemeHint::Docker => DetectedSource::DaemonImage(rest.to_owned()),
        SchemeHint::DockerArchive => DetectedSource::DockerArchive(PathBuf::from(rest)),
        SchemeHint::OciArchive => DetectedSource::OciArchive(PathBuf::from(rest)),
        SchemeHint::OciDir => DetectedSource::OciDir(PathBuf::from(rest)),
        SchemeHint::Dir => {
            let path = PathBuf::from(rest);
            if !path.is_dir() {
                return Err(SourceError::NotFound {
                    path: rest.to_owned(),
                });
            }
            DetectedSource::Directory(path)
        }
        SchemeHint::Auto => {
            let path = Path::new(rest);
            if path.is_dir() {
                // OCI 레이아웃 마커가 있으면 oci-dir로 추론
                if path.join("oci-layout").is_file() {
                    DetectedSource::OciDir(path.to_path_buf())
                } else {
                    DetectedSource::Directory(path.to_path_buf())
                }
            } else if path.is_file() {
                match peek_archive(path)? {
                    Some(detected) => detected,
                    None => {
                        return Err(SourceError::Unresolvable {
                            input: user_input.to_owned(),
                        });
                    }
                }
            } else if looks_like_image_reference(rest) {
                debug!(reference = rest, "input does not exist on disk, assuming daemon image");
                DetectedSource::DaemonImage(rest.to_owned())
            } else {
                return Err(SourceError::Unresolvable {
                    input: user_input.to_owned(),
                });
            }
        }
    };

    Ok(detected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scheme_recognizes_all_prefixes() {
        assert_eq!(
            parse_scheme("docker:alpine:3.19"),
            (SchemeHint::Docker, "alpine:3.19")
        );
        assert_eq!(
            parse_scheme("docker-archive:/tmp/img.tar"),
            (SchemeHint::DockerArchive, "/tmp/img.tar")
        );
        assert_eq!(
            parse_scheme("oci-archive:/tmp/img.tar"),
            (SchemeHint::OciArchive, "/tmp/img.tar")
        );
        assert_eq!(
            parse_scheme("oci-dir:/tmp/layout"),
            (SchemeHint::OciDir, "/tmp/layout")
        );
        assert_eq!(parse_scheme("dir:/tmp/proj"), (SchemeHint::Dir, "/tmp/proj"));
    }

    #[test]
    fn parse_scheme_without_prefix_is_auto() {
        assert_eq!(parse_scheme("alpine:3.19"), (SchemeHint::Auto, "alpine:3.19"));
        assert_eq!(parse_scheme("/tmp/proj"), (SchemeHint::Auto, "/tmp/proj"));
    }

    #[test]
    fn parse_scheme_longer_prefixes_win() {
        // `docker-archive:`가 `docker:`로 잘리지 않는다
        let (hint, rest) = parse_scheme("docker-archive:img.tar");
        assert_eq!(hint, SchemeHint::DockerArchive);
        assert_eq!(rest, "img.tar");
    }

    #[test]
    fn detect_rejects_empty_input() {
        assert!(matches!(
            detect("").unwrap_err(),
            SourceError::Unresolvable { .. }
        ));
        assert!(matches!(
            detect("dir:").unwrap_err(),
            SourceError::Unresolvable { .. }
        ));
    }

    #[test]
    fn detect_explicit_dir_requires_existing_directory() {
        let err = detect("dir:/nonexistent/for/sure").unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn detect_probes_existing_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().to_string_lossy().to_string();
        let detected = detect(&input).unwrap();
        assert_eq!(detected, DetectedSource::Directory(dir.path().to_path_buf()));
    }

    #[test]
    fn detect_probes_oci_layout_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("oci-layout"), b"{}").unwrap();
        let input = dir.path().to_string_lossy().to_string();
        let detected = detect(&input).unwrap();
        assert_eq!(detected, DetectedSource::OciDir(dir.path().to_path_buf()));
    }

    #[test]
    fn detect_probes_docker_archive_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let tar_path = dir.path().join("img.tar");

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(2);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "manifest.json", &b"[]"[..])
            .unwrap();
        std::fs::write(&tar_path, builder.into_inner().unwrap()).unwrap();

        let input = tar_path.to_string_lossy().to_string();
        let detected = detect(&input).unwrap();
        assert_eq!(detected, DetectedSource::DockerArchive(tar_path));
    }

    #[test]
    fn detect_falls_back_to_daemon_image_reference() {
        let detected = detect("registry.example.com/app:1.0").unwrap();
        assert_eq!(
            detected,
            DetectedSource::DaemonImage("registry.example.com/app:1.0".to_owned())
        );
    }

    #[test]
    fn detect_rejects_garbage_that_is_neither_path_nor_reference() {
        let err = detect("not a valid anything !!").unwrap_err();
        assert!(matches!(err, SourceError::Unresolvable { .. }));
    }

    #[test]
    fn detect_rejects_unrecognized_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("random.bin");
        std::fs::write(&path, b"not a tar file at all").unwrap();

        let input = path.to_string_lossy().to_string();
        let err = detect(&input).unwrap_err();
        assert!(matches!(err, SourceError::Unresolvable { .. }));
    }
}
