//! 다이제스트 cataloger -- 파일 다이제스트 계산
//!
//! 매칭되는 파일의 바이트를 한 번만 스트리밍하면서 구성된 모든
//! 알고리즘의 다이제스트를 동시에 계산합니다. 스킵 의미는 콘텐츠
//! cataloger와 동일합니다 (권한 거부는 파일 단위 스킵).

use std::io::Read;

use sha2::{Digest, Sha256, Sha512};
use tracing::debug;

use drydock_core::catalog::{Artifact, DigestAlgorithm, FileDigest};
use drydock_core::metrics::{CATALOGER_FILES_SKIPPED_TOTAL, LABEL_CATALOGER, LABEL_REASON};
use drydock_core::types::Location;
use drydock_source::FileResolver;

use crate::cataloger::Cataloger;
use crate::error::CatalogError;

/// 스트리밍 해시 상태 (알고리즘별 variant)
enum Hasher {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(bytes),
            Self::Sha512(h) => h.update(bytes),
        }
    }

    fn finish(self) -> FileDigest {
        let (algorithm, bytes) = match self {
            Self::Sha256(h) => (DigestAlgorithm::Sha256, h.finalize().to_vec()),
            Self::Sha512(h) => (DigestAlgorithm::Sha512, h.finalize().to_vec()),
        };
        FileDigest {
            algorithm,
            value: bytes.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

/// 파일 다이제스트를 계산하는 cataloger
pub struct DigestsCataloger {
    globs: Vec<String>,
    algorithms: Vec<DigestAlgorithm>,
}

impl DigestsCataloger {
    /// glob 패턴과 알고리즘 목록으로 cataloger를 생성합니다.
    pub fn new(globs: Vec<String>, algorithms: Vec<DigestAlgorithm>) -> Self {
        Self { globs, algorithms }
    }

    fn digest_location(
        &self,
        resolver: &dyn FileResolver,
        location: &Location,
    ) -> Result<Vec<FileDigest>, CatalogError> {
        let mut reader = resolver.file_contents_by_location(location)?;

        let mut hashers: Vec<Hasher> = self
            .algorithms
            .iter()
            .map(|algorithm| Hasher::new(*algorithm))
            .collect();

        let mut buffer = [0u8; 8192];
        loop {
            let n = reader.read(&mut buffer).map_err(|e| CatalogError::Encode {
                path: location.real_path.clone(),
                reason: e.to_string(),
            })?;
            if n == 0 {
                break;
            }
            for hasher in &mut hashers {
                hasher.update(&buffer[..n]);
            }
        }

        Ok(hashers.into_iter().map(Hasher::finish).collect())
    }
}

impl Cataloger for DigestsCataloger {
    fn name(&self) -> &str {
        "digests-cataloger"
    }

    fn catalog(
        &self,
        resolver: &dyn FileResolver,
    ) -> Result<Vec<(Location, Artifact)>, CatalogError> {
        let mut results = Vec::new();

        let locations = resolver.files_by_glob(&self.globs)?;
        for location in locations {
            match self.digest_location(resolver, &location) {
                Ok(digests) => results.push((location, Artifact::Digests(digests))),
                Err(CatalogError::Resolver(e)) if e.is_permission_denied() => {
                    debug!(
                        path = %location.virtual_path,
                        error = %e,
                        "permission denied, skipping"
                    );
                    metrics::counter!(
                        CATALOGER_FILES_SKIPPED_TOTAL,
                        LABEL_CATALOGER => "digests-cataloger",
                        LABEL_REASON => "permission",
                    )
                    .increment(1);
                }
                Err(e) => return Err(e),
            }
        }

        debug!(files = results.len(), "digests cataloger processed files");
        Ok(results)
    }
}
