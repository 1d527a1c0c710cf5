//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 소스 주소 지정(`Location`, `Scope`, `Scheme`)과 소스 기술 메타데이터
//! (`SourceMetadata`)를 정의합니다. 모든 모듈이 이 타입들을 통해
//! 파일 위치와 스캔 결과를 교환합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 소스 내 단일 파일의 불변 식별자
///
/// `real_path`는 현재 주소 지정 방식으로 파일을 실제로 읽을 수 있는 경로이고
/// (이미지 스코프에서는 `<레이어 digest>:<경로>` 형태), `virtual_path`는
/// 사용자에게 보이는 경로입니다. 두 경로 쌍이 모두 같을 때만 같은 위치로
/// 취급되며, 맵 키로 사용됩니다.
///
/// Location은 resolver가 glob/메타데이터 질의 결과를 보고할 때 생성합니다.
/// cataloger는 임의로 만들지 않습니다.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Location {
    /// 실제 접근 경로
    pub real_path: String,
    /// 사용자 관점 경로
    pub virtual_path: String,
}

impl Location {
    /// 새 Location을 생성합니다.
    pub fn new(real_path: impl Into<String>, virtual_path: impl Into<String>) -> Self {
        Self {
            real_path: real_path.into(),
            virtual_path: virtual_path.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.real_path == self.virtual_path {
            write!(f, "{}", self.virtual_path)
        } else {
            write!(f, "{} (real: {})", self.virtual_path, self.real_path)
        }
    }
}

/// 레이어드 소스에서 노출할 뷰 선택
///
/// `Squashed`는 최종 병합 파일시스템, `AllLayers`는 모든 레이어의 사본을
/// 각각 노출합니다. 디렉토리 소스는 `Squashed` 하나만 지원하며, 지원하지
/// 않는 스코프 요청은 명시적 에러로 거부됩니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// 병합된 최종 파일시스템 상태
    #[default]
    Squashed,
    /// 모든 레이어의 사본 (같은 virtual path가 레이어마다 반복될 수 있음)
    AllLayers,
}

impl Scope {
    /// 지원하는 전체 스코프 목록을 반환합니다.
    pub fn all() -> &'static [Scope] {
        &[Scope::Squashed, Scope::AllLayers]
    }

    /// 문자열에서 스코프를 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "squashed" => Some(Self::Squashed),
            "all-layers" | "alllayers" | "all" => Some(Self::AllLayers),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Squashed => write!(f, "squashed"),
            Self::AllLayers => write!(f, "all-layers"),
        }
    }
}

/// 소스 스킴 -- 콘텐츠 소스의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// 컨테이너 이미지 (daemon, docker-archive, oci-archive, oci-dir)
    Image,
    /// 일반 디렉토리 트리
    Directory,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// 파일 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// 일반 파일
    Regular,
    /// 디렉토리
    Directory,
    /// 심볼릭 링크
    Symlink,
    /// 기타 (FIFO, device 등)
    Other,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Directory => write!(f, "directory"),
            Self::Symlink => write!(f, "symlink"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// 단일 파일의 메타데이터 (resolver 질의 결과)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// 파일 종류
    pub file_type: FileType,
    /// 크기 (바이트)
    pub size: u64,
    /// 퍼미션 비트
    pub mode: u32,
}

/// 이미지 레이어 하나의 기술 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// 레이어 media type
    pub media_type: String,
    /// 레이어 digest (`sha256:<hex>`)
    pub digest: String,
    /// 레이어 크기 (바이트)
    pub size: u64,
}

/// 이미지 소스 기술 정보
///
/// 소스를 열 때 한 번 구성되며 이후 불변입니다. 코덱, 이벤트, 업로드
/// 페이로드가 그대로 소비합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// 사용자가 입력한 원본 문자열
    pub user_input: String,
    /// 리포지토리 (예: `library/alpine`)
    pub repository: String,
    /// 태그 (예: `latest`)
    pub tag: String,
    /// 매니페스트 digest
    pub manifest_digest: String,
    /// 전체 크기 (레이어 합, 바이트)
    pub size: u64,
    /// 레이어 목록 (순서 보존)
    pub layers: Vec<LayerMetadata>,
}

/// 디렉토리 소스 기술 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMetadata {
    /// 절대 경로
    pub path: String,
}

/// 소스 메타데이터 -- 스킴별 기술 정보의 tagged union
///
/// 어떤 variant인지가 곧 스킴을 결정하며, 다른 variant의 필드가 남아 있을
/// 수 없습니다. 인코딩/디코딩은 [`crate::codec`]이 담당합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum SourceMetadata {
    /// 컨테이너 이미지 소스
    Image(ImageMetadata),
    /// 디렉토리 소스
    Directory(DirectoryMetadata),
}

impl SourceMetadata {
    /// 이 메타데이터의 스킴을 반환합니다.
    pub fn scheme(&self) -> Scheme {
        match self {
            Self::Image(_) => Scheme::Image,
            Self::Directory(_) => Scheme::Directory,
        }
    }
}

impl fmt::Display for SourceMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(image) => write!(
                f,
                "image {}:{} ({} layers)",
                image.repository,
                image.tag,
                image.layers.len(),
            ),
            Self::Directory(dir) => write!(f, "directory {}", dir.path),
        }
    }
}

/// 탐지된 OS 배포판 정보
///
/// 이미지/디렉토리의 `os-release`에서 추출합니다. 탐지 실패는 에러가
/// 아니며 단순히 값이 없는 상태입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distro {
    /// 배포판 ID (예: `alpine`, `debian`)
    pub name: String,
    /// 버전 (예: `3.19.1`)
    pub version: String,
    /// ID_LIKE 값 (있을 경우)
    pub id_like: Option<String>,
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn location_equality_is_path_pair_exact() {
        let a = Location::new("sha256:aaa:/etc/passwd", "/etc/passwd");
        let b = Location::new("sha256:aaa:/etc/passwd", "/etc/passwd");
        let c = Location::new("sha256:bbb:/etc/passwd", "/etc/passwd");
        let d = Location::new("sha256:aaa:/etc/passwd", "/etc/shadow");

        assert_eq!(a, b);
        assert_ne!(a, c); // same virtual, different real
        assert_ne!(a, d); // same real, different virtual
    }

    #[test]
    fn location_equality_is_reflexive_symmetric_transitive() {
        let a = Location::new("r", "v");
        let b = Location::new("r", "v");
        let c = Location::new("r", "v");
        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(b, c);
        assert_eq!(a, c);
    }

    #[test]
    fn location_usable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(Location::new("r1", "v1"), 1);
        map.insert(Location::new("r2", "v1"), 2);
        // 같은 키를 다시 넣으면 덮어쓴다
        map.insert(Location::new("r1", "v1"), 3);

        assert_eq!(map.len(), 2);
        assert_eq!(map[&Location::new("r1", "v1")], 3);
    }

    #[test]
    fn location_display() {
        let same = Location::new("src/main.rs", "src/main.rs");
        assert_eq!(same.to_string(), "src/main.rs");

        let layered = Location::new("sha256:abc:/etc/passwd", "/etc/passwd");
        assert!(layered.to_string().contains("/etc/passwd"));
        assert!(layered.to_string().contains("sha256:abc"));
    }

    #[test]
    fn scope_from_str_loose() {
        assert_eq!(Scope::from_str_loose("squashed"), Some(Scope::Squashed));
        assert_eq!(Scope::from_str_loose("SQUASHED"), Some(Scope::Squashed));
        assert_eq!(Scope::from_str_loose("all-layers"), Some(Scope::AllLayers));
        assert_eq!(Scope::from_str_loose("AllLayers"), Some(Scope::AllLayers));
        assert_eq!(Scope::from_str_loose("everything"), None);
    }

    #[test]
    fn scope_default_is_squashed() {
        assert_eq!(Scope::default(), Scope::Squashed);
    }

    #[test]
    fn scope_display_roundtrips_through_from_str_loose() {
        for scope in Scope::all() {
            assert_eq!(Scope::from_str_loose(&scope.to_string()), Some(*scope));
        }
    }

    #[test]
    fn scope_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Scope::AllLayers).unwrap();
        assert_eq!(json, "\"all-layers\"");
        let back: Scope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Scope::AllLayers);
    }

    #[test]
    fn scheme_display() {
        assert_eq!(Scheme::Image.to_string(), "image");
        assert_eq!(Scheme::Directory.to_string(), "directory");
    }

    fn sample_image_metadata() -> ImageMetadata {
        ImageMetadata {
            user_input: "alpine:3.19".to_owned(),
            repository: "alpine".to_owned(),
            tag: "3.19".to_owned(),
            manifest_digest: "sha256:deadbeef".to_owned(),
            size: 7_340_032,
            layers: vec![LayerMetadata {
                media_type: "application/vnd.docker.image.rootfs.diff.tar".to_owned(),
                digest: "sha256:cafebabe".to_owned(),
                size: 7_340_032,
            }],
        }
    }

    #[test]
    fn source_metadata_scheme_accessor() {
        let image = SourceMetadata::Image(sample_image_metadata());
        assert_eq!(image.scheme(), Scheme::Image);

        let dir = SourceMetadata::Directory(DirectoryMetadata {
            path: "/tmp/proj".to_owned(),
        });
        assert_eq!(dir.scheme(), Scheme::Directory);
    }

    #[test]
    fn source_metadata_serde_roundtrip() {
        let metadata = SourceMetadata::Image(sample_image_metadata());
        let json = serde_json::to_string(&metadata).unwrap();
        let back: SourceMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata, back);
    }

    #[test]
    fn source_metadata_display() {
        let image = SourceMetadata::Image(sample_image_metadata());
        assert!(image.to_string().contains("alpine:3.19"));

        let dir = SourceMetadata::Directory(DirectoryMetadata {
            path: "/srv/app".to_owned(),
        });
        assert!(dir.to_string().contains("/srv/app"));
    }

    #[test]
    fn file_type_display() {
        assert_eq!(FileType::Regular.to_string(), "regular");
        assert_eq!(FileType::Symlink.to_string(), "symlink");
    }

    #[test]
    fn distro_display() {
        let distro = Distro {
            name: "alpine".to_owned(),
            version: "3.19.1".to_owned(),
            id_like: None,
        };
        assert_eq!(distro.to_string(), "alpine 3.19.1");

        let no_version = Distro {
            name: "arch".to_owned(),
            version: String::new(),
            id_like: None,
        };
        assert_eq!(no_version.to_string(), "arch");
    }
}
