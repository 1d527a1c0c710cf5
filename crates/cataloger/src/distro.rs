//! 배포판 탐지 -- os-release 기반 OS 식별
//!
//! 소스 파일시스템의 `os-release`를 읽어 배포판을 식별합니다.
//! 파일이 없거나 파싱할 수 없으면 단순히 `None`이며, 에러가 아닙니다.

use std::io::Read;

use tracing::debug;

use drydock_core::types::Distro;
use drydock_source::FileResolver;

/// os-release 후보 경로 (우선순위 순)
const OS_RELEASE_PATHS: &[&str] = &["etc/os-release", "usr/lib/os-release"];

/// resolver가 노출하는 파일시스템에서 배포판을 탐지합니다.
pub fn identify_distro(resolver: &dyn FileResolver) -> Option<Distro> {
    for path in OS_RELEASE_PATHS {
        let locations = match resolver.files_by_glob(&[(*path).to_owned()]) {
            Ok(locations) => locations,
            Err(e) => {
                debug!(path, error = %e, "os-release lookup failed");
                continue;
            }
        };
        let Some(location) = locations.first() else {
            continue;
        };

        let mut reader = match resolver.file_contents_by_location(location) {
            Ok(reader) => reader,
            Err(e) => {
                debug!(path, error = %e, "os-release open failed");
                continue;
            }
        };

        let mut content = String::new();
        if reader.read_to_string(&mut content).is_err() {
            continue;
        }

        if let Some(distro) = parse_os_release(&content) {
            debug!(distro = %distro, "distro identified");
            return Some(distro);
        }
    }

    debug!("no os-release found, distro unidentified");
    None
}

/// os-release의 KEY=VALUE 본문을 파싱합니다.
///
/// `ID`가 없으면 식별 실패로 간주합니다.
pub fn parse_os_release(content: &str) -> Option<Distro> {
    let mut id = None;
    let mut version_id = None;
    let mut id_like = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');

        match key.trim() {
            "ID" => id = Some(value.to_owned()),
            "VERSION_ID" => version_id = Some(value.to_owned()),
            "ID_LIKE" => id_like = Some(value.to_owned()),
            _ => {}
        }
    }

    id.map(|name| Distro {
        name,
        version: version_id.unwrap_or_default(),
        id_like,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryResolver;

    const ALPINE_OS_RELEASE: &str = r#"
NAME="Alpine Linux"
ID=alpine
VERSION_ID=3.19.1
PRETTY_NAME="Alpine Linux v3.19"
HOME_URL="https://alpinelinux.org/"
"#;

    #[test]
    fn parse_os_release_extracts_fields() {
        let distro = parse_os_release(ALPINE_OS_RELEASE).unwrap();
        assert_eq!(distro.name, "alpine");
        assert_eq!(distro.version, "3.19.1");
        assert_eq!(distro.id_like, None);
    }

    #[test]
    fn parse_os_release_handles_quotes_and_id_like() {
        let content = "ID=\"ubuntu\"\nVERSION_ID='22.04'\nID_LIKE=debian\n";
        let distro = parse_os_release(content).unwrap();
        assert_eq!(distro.name, "ubuntu");
        assert_eq!(distro.version, "22.04");
        assert_eq!(distro.id_like.as_deref(), Some("debian"));
    }

    #[test]
    fn parse_os_release_without_id_is_none() {
        assert!(parse_os_release("NAME=\"Something\"\n").is_none());
        assert!(parse_os_release("").is_none());
    }

    #[test]
    fn parse_os_release_ignores_comments_and_garbage() {
        let content = "# comment\nnot a pair\nID=debian\n";
        let distro = parse_os_release(content).unwrap();
        assert_eq!(distro.name, "debian");
        assert_eq!(distro.version, "");
    }

    #[test]
    fn identify_distro_reads_etc_os_release() {
        let resolver =
            MemoryResolver::new().with_file("etc/os-release", ALPINE_OS_RELEASE.as_bytes());

        let distro = identify_distro(&resolver).unwrap();
        assert_eq!(distro.name, "alpine");
    }

    #[test]
    fn identify_distro_falls_back_to_usr_lib() {
        let resolver = MemoryResolver::new()
            .with_file("usr/lib/os-release", b"ID=fedora\nVERSION_ID=39\n");

        let distro = identify_distro(&resolver).unwrap();
        assert_eq!(distro.name, "fedora");
        assert_eq!(distro.version, "39");
    }

    #[test]
    fn identify_distro_returns_none_when_absent() {
        let resolver = MemoryResolver::new().with_file("etc/hostname", b"box");
        assert!(identify_distro(&resolver).is_none());
    }
}
