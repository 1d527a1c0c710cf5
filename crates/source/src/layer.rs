//! 이미지 레이어 추출
//!
//! 레이어 tar를 임시 영역에 풀고, resolver가 사용할 경로 인덱스를
//! 만듭니다. OCI 오버레이 규약의 whiteout 마커(`.wh.<name>`,
//! `.wh..wh..opq`)는 풀지 않고 별도로 기록하여 squashed 뷰 계산에
//! 사용합니다.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use drydock_core::types::FileType;

use crate::error::SourceError;

/// whiteout 파일명 접두어
const WHITEOUT_PREFIX: &str = ".wh.";
/// opaque 디렉토리 마커 파일명
const OPAQUE_WHITEOUT: &str = ".wh..wh..opq";

/// 추출된 레이어 내 단일 엔트리
#[derive(Debug, Clone)]
pub(crate) struct LayerEntry {
    /// 추출된 실제 파일 경로
    pub disk_path: PathBuf,
    /// 파일 종류
    pub file_type: FileType,
    /// 크기 (바이트)
    pub size: u64,
    /// 퍼미션 비트
    pub mode: u32,
}

/// 디스크에 추출된 레이어 하나
#[derive(Debug)]
pub(crate) struct ExtractedLayer {
    /// 레이어 digest (`sha256:<hex>`)
    pub digest: String,
    /// 정규화된 경로 → 엔트리 인덱스
    pub entries: BTreeMap<String, LayerEntry>,
    /// 이 레이어가 지우는 하위 레이어 경로 목록
    pub whiteouts: Vec<String>,
    /// 이 레이어에서 opaque 처리된 디렉토리 목록
    pub opaque_dirs: Vec<String>,
}

/// tar 엔트리 경로를 정규화합니다 (선행 `./`, `/` 제거).
///
/// `..` 컴포넌트를 포함하는 경로는 None을 반환합니다.
fn normalize_entry_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// 레이어 tar 스트림을 `dest` 아래에 추출하고 인덱스를 만듭니다.
pub(crate) fn extract_layer(
    reader: impl Read,
    digest: &str,
    dest: &Path,
) -> Result<ExtractedLayer, SourceError> {
    std::fs::create_dir_all(dest).map_err(|e| SourceError::from_io(dest.to_string_lossy(), e))?;

    let digest = digest.to_owned();
    let mut entries = BTreeMap::new();
    let mut whiteouts = Vec::new();
    let mut opaque_dirs = Vec::new();

    let mut archive = tar::Archive::new(reader);
    let iter = archive.entries().map_err(|e| SourceError::Archive {
        path: dest.to_string_lossy().to_string(),
        reason: format!("reading layer entries: {e}"),
    })?;

    for entry in iter {
        let mut entry = entry.map_err(|e| SourceError::Archive {
            path: dest.to_string_lossy().to_string(),
            reason: format!("reading layer entry: {e}"),
        })?;

        let raw_path = entry
            .path()
            .map_err(|e| SourceError::Archive {
                path: dest.to_string_lossy().to_string(),
                reason: format!("entry path: {e}"),
            })?
            .into_owned();

        let Some(normalized) = normalize_entry_path(&raw_path) else {
            warn!(path = %raw_path.display(), "skipping layer entry with unsafe path");
            continue;
        };

        // whiteout 마커는 추출하지 않고 기록만 한다
        let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);
        if file_name == OPAQUE_WHITEOUT {
            let parent = normalized
                .strip_suffix(OPAQUE_WHITEOUT)
                .unwrap_or("")
                .trim_end_matches('/');
            opaque_dirs.push(parent.to_owned());
            continue;
        }
        if let Some(target_name) = file_name.strip_prefix(WHITEOUT_PREFIX) {
            let parent_len = normalized.len() - file_name.len();
            let target = format!("{}{}", &normalized[..parent_len], target_name);
            whiteouts.push(target);
            continue;
        }

        let header = entry.header();
        let file_type = match header.entry_type() {
            tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::GNUSparse => {
                FileType::Regular
            }
            tar::EntryType::Link => FileType::Regular,
            tar::EntryType::Directory => FileType::Directory,
            tar::EntryType::Symlink => FileType::Symlink,
            _ => FileType::Other,
        };
        let size = header.size().unwrap_or(0);
        let mode = header.mode().unwrap_or(0) & 0o7777;

        let unpacked = entry.unpack_in(dest).map_err(|e| SourceError::Archive {
            path: dest.to_string_lossy().to_string(),
            reason: format!("unpacking '{normalized}': {e}"),
        })?;
        if !unpacked {
            warn!(path = %normalized, "layer entry escaped extraction root, skipped");
            continue;
        }

        entries.insert(
            normalized.clone(),
            LayerEntry {
                disk_path: dest.join(&normalized),
                file_type,
                size,
                mode,
            },
        );
    }

    debug!(
        digest = %digest,
        entries = entries.len(),
        whiteouts = whiteouts.len(),
        "layer extracted"
    );

    Ok(ExtractedLayer {
        digest,
        entries,
        whiteouts,
        opaque_dirs,
    })
}

/// gzip 여부를 매직 바이트로 판별하여 파일 리더를 엽니다.
pub(crate) fn open_maybe_gzip(path: &Path) -> Result<Box<dyn Read>, SourceError> {
    let mut file =
        File::open(path).map_err(|e| SourceError::from_io(path.to_string_lossy(), e))?;

    let mut magic = [0u8; 2];
    let n = file
        .read(&mut magic)
        .map_err(|e| SourceError::from_io(path.to_string_lossy(), e))?;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| SourceError::from_io(path.to_string_lossy(), e))?;

    if n == 2 && magic == [0x1f, 0x8b] {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// 파일의 SHA-256 digest를 `sha256:<hex>` 형태로 계산합니다.
pub(crate) fn sha256_of_file(path: &Path) -> Result<String, SourceError> {
    let mut file =
        File::open(path).map_err(|e| SourceError::from_io(path.to_string_lossy(), e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)
        .map_err(|e| SourceError::from_io(path.to_string_lossy(), e))?;

    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    Ok(format!("sha256:{hex}"))
}
