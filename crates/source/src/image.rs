//! 이미지 소스 -- 아카이브/레이아웃 해석과 스코프별 resolver
//!
//! docker-archive(`docker save` 출력), OCI 아카이브, OCI 레이아웃
//! 디렉토리를 열어 레이어를 임시 영역에 추출하고, squashed /
//! all-layers 두 가지 뷰의 [`FileResolver`]를 제공합니다.
//!
//! # 주소 지정
//!
//! 이미지 스코프의 Location은 virtual path(`/etc/passwd`)와 레이어
//! 한정 real path(`sha256:<hex>:/etc/passwd`)의 쌍입니다. squashed
//! 뷰에서는 나중 레이어가 같은 virtual path를 가리는 반면, all-layers
//! 뷰에서는 모든 레이어의 사본이 각각의 Location으로 나타납니다.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use drydock_core::types::{
    FileMetadata, FileType, ImageMetadata, LayerMetadata, Location,
};

use crate::error::SourceError;
use crate::layer::{ExtractedLayer, LayerEntry, extract_layer, open_maybe_gzip, sha256_of_file};
use crate::resolver::{FileResolver, build_globset, glob_matches};

/// docker-archive 레이어의 media type
const DOCKER_LAYER_MEDIA_TYPE: &str = "application/vnd.docker.image.rootfs.diff.tar";

/// `manifest.json`의 엔트리 (docker save 형식)
#[derive(Debug, Deserialize)]
struct DockerManifestEntry {
    #[serde(rename = "Config")]
    config: String,
    #[serde(rename = "RepoTags")]
    repo_tags: Option<Vec<String>>,
    #[serde(rename = "Layers")]
    layers: Vec<String>,
}

/// OCI descriptor (index.json / manifest 공용)
#[derive(Debug, Deserialize)]
struct OciDescriptor {
    #[serde(rename = "mediaType", default)]
    media_type: String,
    digest: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    annotations: Option<BTreeMap<String, String>>,
}

/// OCI `index.json`
#[derive(Debug, Deserialize)]
struct OciIndex {
    manifests: Vec<OciDescriptor>,
}

/// OCI 이미지 매니페스트
#[derive(Debug, Deserialize)]
struct OciManifest {
    layers: Vec<OciDescriptor>,
}

/// 열린 이미지 -- 추출된 레이어와 기술 메타데이터
#[derive(Debug)]
pub(crate) struct OpenedImage {
    pub metadata: ImageMetadata,
    layers: Vec<ExtractedLayer>,
}

/// 이미지 참조 문자열을 (repository, tag)로 분해합니다.
pub(crate) fn parse_reference(reference: &str) -> (String, String) {
    let reference = reference.trim();
    if let Some((name, digest)) = reference.split_once('@') {
        return (name.to_owned(), digest.to_owned());
    }
    match reference.rsplit_once(':') {
        // `:` 뒤에 `/`가 있으면 포트 구분자이지 태그가 아니다
        Some((name, tag)) if !tag.contains('/') && !name.is_empty() => {
            (name.to_owned(), tag.to_owned())
        }
        _ => (reference.to_owned(), "latest".to_owned()),
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let content =
        std::fs::read(path).map_err(|e| SourceError::from_io(path.to_string_lossy(), e))?;
    serde_json::from_slice(&content).map_err(|e| SourceError::Manifest {
        reason: format!("{}: {e}", path.display()),
    })
}

/// digest(`sha256:<hex>`)를 OCI blob 경로로 변환합니다.
fn blob_path(layout_dir: &Path, digest: &str) -> Result<PathBuf, SourceError> {
    let (algorithm, hex) = digest.split_once(':').ok_or_else(|| SourceError::Manifest {
        reason: format!("malformed digest '{digest}'"),
    })?;
    Ok(layout_dir.join("blobs").join(algorithm).join(hex))
}

impl OpenedImage {
    /// docker-archive(`docker save` tar)를 엽니다.
    pub(crate) fn open_docker_archive(
        tar_path: &Path,
        workspace: &Path,
        user_input: &str,
    ) -> Result<Self, SourceError> {
        let archive_dir = workspace.join("archive");
        std::fs::create_dir_all(&archive_dir)
            .map_err(|e| SourceError::from_io(archive_dir.to_string_lossy(), e))?;

        let reader = open_maybe_gzip(tar_path)?;
        tar::Archive::new(reader)
            .unpack(&archive_dir)
            .map_err(|e| SourceError::Archive {
                path: tar_path.to_string_lossy().to_string(),
                reason: format!("unpacking archive: {e}"),
            })?;

        let manifest_path = archive_dir.join("manifest.json");
        let manifest: Vec<DockerManifestEntry> = read_json_file(&manifest_path)?;
        let entry = manifest.first().ok_or_else(|| SourceError::Manifest {
            reason: "manifest.json contains no images".to_owned(),
        })?;

        let (repository, tag) = entry
            .repo_tags
            .as_ref()
            .and_then(|tags| tags.first())
            .map(|t| parse_reference(t))
            .unwrap_or_else(|| parse_reference(user_input));

        // config 파일명(`<hex>.json` 또는 `blobs/sha256/<hex>`)이 이미지 ID
        let config_name = entry
            .config
            .rsplit('/')
            .next()
            .unwrap_or(&entry.config)
            .trim_end_matches(".json");
        let manifest_digest = if config_name.contains(':') {
            config_name.to_owned()
        } else {
            format!("sha256:{config_name}")
        };

        let mut layers = Vec::with_capacity(entry.layers.len());
        let mut layer_metadata = Vec::with_capacity(entry.layers.len());
        let mut total_size = 0u64;

        for (index, layer_rel) in entry.layers.iter().enumerate() {
            let layer_file = archive_dir.join(layer_rel);
            let digest = sha256_of_file(&layer_file)?;
            let size = std::fs::metadata(&layer_file)
                .map_err(|e| SourceError::from_io(layer_file.to_string_lossy(), e))?
                .len();

            let reader = open_maybe_gzip(&layer_file)?;
            let extracted =
                extract_layer(reader, &digest, &workspace.join(format!("layer-{index}")))?;

            layer_metadata.push(LayerMetadata {
                media_type: DOCKER_LAYER_MEDIA_TYPE.to_owned(),
                digest,
                size,
            });
            total_size += size;
            layers.push(extracted);
        }

        debug!(
            repository = %repository,
            tag = %tag,
            layers = layers.len(),
            "docker archive opened"
        );

        Ok(Self {
            metadata: ImageMetadata {
                user_input: user_input.to_owned(),
                repository,
                tag,
                manifest_digest,
                size: total_size,
                layers: layer_metadata,
            },
            layers,
        })
    }

    /// OCI 레이아웃 디렉토리를 엽니다.
    pub(crate) fn open_oci_layout(
        layout_dir: &Path,
        workspace: &Path,
        user_input: &str,
    ) -> Result<Self, SourceError> {
        let index: OciIndex = read_json_file(&layout_dir.join("index.json"))?;
        let descriptor = index.manifests.first().ok_or_else(|| SourceError::Manifest {
            reason: "index.json contains no manifests".to_owned(),
        })?;

        let (repository, tag) = descriptor
            .annotations
            .as_ref()
            .and_then(|a| a.get("org.opencontainers.image.ref.name"))
            .map(|r| parse_reference(r))
            .unwrap_or_else(|| parse_reference(user_input));

        let manifest: OciManifest = read_json_file(&blob_path(layout_dir, &descriptor.digest)?)?;

        let mut layers = Vec::with_capacity(manifest.layers.len());
        let mut layer_metadata = Vec::with_capacity(manifest.layers.len());
        let mut total_size = 0u64;

        for (index, layer_descriptor) in manifest.layers.iter().enumerate() {
            let layer_file = blob_path(layout_dir, &layer_descriptor.digest)?;
            let reader = open_maybe_gzip(&layer_file)?;
            let extracted = extract_layer(
                reader,
                &layer_descriptor.digest,
                &workspace.join(format!("layer-{index}")),
            )?;

            layer_metadata.push(LayerMetadata {
                media_type: layer_descriptor.media_type.clone(),
                digest: layer_descriptor.digest.clone(),
                size: layer_descriptor.size,
            });
            total_size += layer_descriptor.size;
            layers.push(extracted);
        }

        debug!(
            repository = %repository,
            tag = %tag,
            layers = layers.len(),
            "oci layout opened"
        );

        Ok(Self {
            metadata: ImageMetadata {
                user_input: user_input.to_owned(),
                repository,
                tag,
                manifest_digest: descriptor.digest.clone(),
                size: total_size,
                layers: layer_metadata,
            },
            layers,
        })
    }

    /// OCI 아카이브(tar로 묶인 OCI 레이아웃)를 엽니다.
    pub(crate) fn open_oci_archive(
        tar_path: &Path,
        workspace: &Path,
        user_input: &str,
    ) -> Result<Self, SourceError> {
        let layout_dir = workspace.join("oci");
        std::fs::create_dir_all(&layout_dir)
            .map_err(|e| SourceError::from_io(layout_dir.to_string_lossy(), e))?;

        let reader = open_maybe_gzip(tar_path)?;
        tar::Archive::new(reader)
            .unpack(&layout_dir)
            .map_err(|e| SourceError::Archive {
                path: tar_path.to_string_lossy().to_string(),
                reason: format!("unpacking oci archive: {e}"),
            })?;

        Self::open_oci_layout(&layout_dir, workspace, user_input)
    }

    /// squashed 뷰 resolver를 만듭니다.
    ///
    /// 레이어를 순서대로 접어 나중 레이어의 파일이 같은 virtual path의
    /// 이전 파일을 가리고, whiteout이 지운 경로는 제외됩니다.
    pub(crate) fn squashed_resolver(&self) -> SquashedImageResolver {
        let mut merged: BTreeMap<String, ResolvedFile> = BTreeMap::new();

        for layer in &self.layers {
            for target in &layer.whiteouts {
                let prefix = format!("{target}/");
                merged.retain(|path, _| path != target && !path.starts_with(&prefix));
            }
            for dir in &layer.opaque_dirs {
                let prefix = format!("{dir}/");
                merged.retain(|path, _| !path.starts_with(&prefix));
            }
            for (path, entry) in &layer.entries {
                if !matches!(entry.file_type, FileType::Regular | FileType::Symlink) {
                    continue;
                }
                merged.insert(path.clone(), ResolvedFile::new(&layer.digest, path, entry));
            }
        }

        SquashedImageResolver { entries: merged }
    }

    /// all-layers 뷰 resolver를 만듭니다.
    ///
    /// 모든 레이어의 사본이 각각의 Location으로 나타나며, 같은 virtual
    /// path가 서로 다른 real path로 반복될 수 있습니다.
    pub(crate) fn all_layers_resolver(&self) -> AllLayersImageResolver {
        let mut entries = Vec::new();
        for layer in &self.layers {
            for (path, entry) in &layer.entries {
                if !matches!(entry.file_type, FileType::Regular | FileType::Symlink) {
                    continue;
                }
                entries.push(ResolvedFile::new(&layer.digest, path, entry));
            }
        }
        AllLayersImageResolver { entries }
    }
}

/// resolver 인덱스의 단일 항목
#[derive(Debug, Clone)]
struct ResolvedFile {
    location: Location,
    disk_path: PathBuf,
    metadata: FileMetadata,
}

impl ResolvedFile {
    fn new(layer_digest: &str, path: &str, entry: &LayerEntry) -> Self {
        Self {
            location: Location::new(format!("{layer_digest}:/{path}"), format!("/{path}")),
            disk_path: entry.disk_path.clone(),
            metadata: FileMetadata {
                file_type: entry.file_type,
                size: entry.size,
                mode: entry.mode,
            },
        }
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, SourceError> {
        let file = File::open(&self.disk_path)
            .map_err(|e| SourceError::from_io(self.disk_path.to_string_lossy(), e))?;
        Ok(Box::new(file))
    }
}

/// squashed 이미지 뷰 resolver
pub struct SquashedImageResolver {
    /// 정규화된 virtual path → 병합된 최종 항목
    entries: BTreeMap<String, ResolvedFile>,
}

impl SquashedImageResolver {
    fn find(&self, location: &Location) -> Result<&ResolvedFile, SourceError> {
        let key = location.virtual_path.trim_start_matches('/');
        match self.entries.get(key) {
            Some(entry) if entry.location == *location => Ok(entry),
            _ => Err(SourceError::NotFound {
                path: location.virtual_path.clone(),
            }),
        }
    }

    /// 심볼릭 링크의 대상을 병합 뷰 안에서 해석합니다 (1단계).
    fn resolve_symlink(&self, entry: &ResolvedFile) -> Result<&ResolvedFile, SourceError> {
        let target = std::fs::read_link(&entry.disk_path)
            .map_err(|e| SourceError::from_io(entry.disk_path.to_string_lossy(), e))?;

        let virtual_path = entry.location.virtual_path.trim_start_matches('/');
        let parent = virtual_path.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
        let joined = if target.is_absolute() {
            target.to_string_lossy().trim_start_matches('/').to_owned()
        } else if parent.is_empty() {
            target.to_string_lossy().to_string()
        } else {
            format!("{parent}/{}", target.to_string_lossy())
        };

        // `..` / `.` 컴포넌트 정리
        let mut parts: Vec<&str> = Vec::new();
        for part in joined.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        let normalized = parts.join("/");

        self.entries
            .get(&normalized)
            .filter(|e| e.metadata.file_type == FileType::Regular)
            .ok_or_else(|| SourceError::NotFound {
                path: format!("{} -> {normalized}", entry.location.virtual_path),
            })
    }
}

impl FileResolver for SquashedImageResolver {
    fn files_by_glob(&self, patterns: &[String]) -> Result<Vec<Location>, SourceError> {
        let set = build_globset(patterns)?;
        Ok(self
            .entries
            .values()
            .filter(|e| glob_matches(&set, &e.location.virtual_path))
            .map(|e| e.location.clone())
            .collect())
    }

    fn file_metadata_by_location(
        &self,
        location: &Location,
    ) -> Result<FileMetadata, SourceError> {
        Ok(self.find(location)?.metadata.clone())
    }

    fn file_contents_by_location(
        &self,
        location: &Location,
    ) -> Result<Box<dyn Read + Send>, SourceError> {
        let entry = self.find(location)?;
        if entry.metadata.file_type == FileType::Symlink {
            // 링크 대상이 다른 레이어에만 있을 수 있으므로 뷰 안에서 해석한다
            return self.resolve_symlink(entry)?.open();
        }
        entry.open()
    }
}

/// all-layers 이미지 뷰 resolver
pub struct AllLayersImageResolver {
    entries: Vec<ResolvedFile>,
}

impl AllLayersImageResolver {
    fn find(&self, location: &Location) -> Result<&ResolvedFile, SourceError> {
        self.entries
            .iter()
            .find(|e| e.location == *location)
            .ok_or_else(|| SourceError::NotFound {
                path: location.real_path.clone(),
            })
    }
}

impl FileResolver for AllLayersImageResolver {
    fn files_by_glob(&self, patterns: &[String]) -> Result<Vec<Location>, SourceError> {
        let set = build_globset(patterns)?;
        let mut locations: Vec<Location> = self
            .entries
            .iter()
            .filter(|e| glob_matches(&set, &e.location.virtual_path))
            .map(|e| e.location.clone())
            .collect();
        // 중복 Location은 동등성 기준으로 한 번만
        locations.sort();
        locations.dedup();
        Ok(locations)
    }

    fn file_metadata_by_location(
        &self,
        location: &Location,
    ) -> Result<FileMetadata, SourceError> {
        Ok(self.find(location)?.metadata.clone())
    }

    fn file_contents_by_location(
        &self,
        location: &Location,
    ) -> Result<Box<dyn Read + Send>, SourceError> {
        let entry = self.find(location)?;
        if entry.metadata.file_type == FileType::Symlink {
            warn!(path = %location.virtual_path, "reading symlink content from a single layer");
        }
        entry.open()
    }
}
