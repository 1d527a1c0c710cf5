//! 카탈로그 집계 -- 한 번의 스캔이 생산한 아티팩트의 최종 스냅샷
//!
//! [`Catalog`]는 모든 cataloger의 결과를 [`Location`] 기준으로 합친
//! 불변 스냅샷입니다. 파이프라인이 한 번의 실행당 하나를 생산하며,
//! 이벤트로 발행된 이후에는 수정되지 않습니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Location, Scope, SourceMetadata};

/// 다이제스트 알고리즘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// 문자열에서 알고리즘을 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "").as_str() {
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

/// 단일 파일의 다이제스트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    /// 알고리즘
    pub algorithm: DigestAlgorithm,
    /// 16진수 다이제스트 값
    pub value: String,
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

/// cataloger가 추출한 아티팩트 (종류별 tagged union)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Artifact {
    /// base64로 인코딩된 파일 콘텐츠
    Contents(String),
    /// 파일 다이제스트 목록
    Digests(Vec<FileDigest>),
}

impl Artifact {
    /// 아티팩트 종류명을 반환합니다 (로깅/렌더링용).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Contents(_) => "contents",
            Self::Digests(_) => "digests",
        }
    }
}

/// 하나의 Location에 결속된 아티팩트 묶음
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// 파일 위치
    pub location: Location,
    /// 이 위치에서 추출된 아티팩트들
    pub artifacts: Vec<Artifact>,
}

/// 한 번의 스캔에 대한 전체 카탈로그
///
/// Location은 경로 쌍 동등성 기준으로 유일합니다. 스킵된 파일은 엔트리
/// 자체가 없으며, 에러 마커로 남지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// 스캔 대상 소스의 메타데이터
    pub source: SourceMetadata,
    /// 스캔에 사용된 스코프
    pub scope: Scope,
    /// Location별 아티팩트 엔트리
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// 빈 카탈로그를 생성합니다.
    pub fn new(source: SourceMetadata, scope: Scope) -> Self {
        Self {
            source,
            scope,
            entries: Vec::new(),
        }
    }

    /// 아티팩트 하나를 추가합니다.
    ///
    /// 같은 Location의 엔트리가 이미 있으면 그 엔트리에 덧붙입니다.
    pub fn insert(&mut self, location: Location, artifact: Artifact) {
        match self.entries.iter_mut().find(|e| e.location == location) {
            Some(entry) => entry.artifacts.push(artifact),
            None => self.entries.push(CatalogEntry {
                location,
                artifacts: vec![artifact],
            }),
        }
    }

    /// cataloger 하나의 결과 집합을 합칩니다.
    pub fn extend(&mut self, results: Vec<(Location, Artifact)>) {
        for (location, artifact) in results {
            self.insert(location, artifact);
        }
    }

    /// 주어진 Location의 아티팩트들을 반환합니다.
    pub fn artifacts_at(&self, location: &Location) -> Option<&[Artifact]> {
        self.entries
            .iter()
            .find(|e| e.location == *location)
            .map(|e| e.artifacts.as_slice())
    }

    /// Location 엔트리 수를 반환합니다.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// 전체 아티팩트 수를 반환합니다.
    pub fn artifact_count(&self) -> usize {
        self.entries.iter().map(|e| e.artifacts.len()).sum()
    }

    /// 엔트리가 없는지 반환합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Catalog({}, scope={}, {} locations, {} artifacts)",
            self.source,
            self.scope,
            self.entry_count(),
            self.artifact_count(),
        )
    }
}
