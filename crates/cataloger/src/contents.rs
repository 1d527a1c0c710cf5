//! 콘텐츠 cataloger -- 파일 내용의 base64 수집
//!
//! 구성된 glob 패턴에 매칭되는 파일의 내용을 스트리밍 base64 인코딩으로
//! 수집합니다. 크기 임계값을 넘는 파일과 권한이 거부된 파일은 조용히
//! 스킵되며 (결과에 엔트리 없음), 그 외의 열기/읽기 실패는 실행 전체를
//! 중단시킵니다.

use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderWriter;
use tracing::debug;

use drydock_core::catalog::Artifact;
use drydock_core::metrics::{CATALOGER_FILES_SKIPPED_TOTAL, LABEL_CATALOGER, LABEL_REASON};
use drydock_core::types::Location;
use drydock_source::FileResolver;

use crate::cataloger::Cataloger;
use crate::error::CatalogError;

/// 파일 내용을 base64로 수집하는 cataloger
pub struct ContentsCataloger {
    globs: Vec<String>,
    /// 이 크기(바이트)를 넘는 파일은 스킵. 0이면 제한 없음
    skip_files_above_size: u64,
}

impl ContentsCataloger {
    /// glob 패턴과 크기 임계값으로 cataloger를 생성합니다.
    pub fn new(globs: Vec<String>, skip_files_above_size: u64) -> Self {
        Self {
            globs,
            skip_files_above_size,
        }
    }

    fn catalog_location(
        &self,
        resolver: &dyn FileResolver,
        location: &Location,
    ) -> Result<String, CatalogError> {
        let mut reader = resolver.file_contents_by_location(location)?;

        // 스트림을 base64 인코더를 거쳐 메모리 버퍼로 복사한다.
        // reader는 성공/실패와 무관하게 스코프를 벗어나며 해제된다.
        let mut encoder = EncoderWriter::new(Vec::new(), &STANDARD);
        std::io::copy(&mut reader, &mut encoder).map_err(|e| CatalogError::Encode {
            path: location.real_path.clone(),
            reason: e.to_string(),
        })?;
        let encoded = encoder.finish().map_err(|e| CatalogError::Encode {
            path: location.real_path.clone(),
            reason: e.to_string(),
        })?;

        String::from_utf8(encoded).map_err(|e| CatalogError::Encode {
            path: location.real_path.clone(),
            reason: e.to_string(),
        })
    }
}

impl Cataloger for ContentsCataloger {
    fn name(&self) -> &str {
        "contents-cataloger"
    }

    fn catalog(
        &self,
        resolver: &dyn FileResolver,
    ) -> Result<Vec<(Location, Artifact)>, CatalogError> {
        let mut results = Vec::new();

        let locations = resolver.files_by_glob(&self.globs)?;
        for location in locations {
            let metadata = resolver.file_metadata_by_location(&location)?;

            if self.skip_files_above_size > 0 && metadata.size > self.skip_files_above_size {
                debug!(
                    path = %location.virtual_path,
                    size = metadata.size,
                    max = self.skip_files_above_size,
                    "file exceeds size threshold, skipping"
                );
                metrics::counter!(
                    CATALOGER_FILES_SKIPPED_TOTAL,
                    LABEL_CATALOGER => "contents-cataloger",
                    LABEL_REASON => "size",
                )
                .increment(1);
                continue;
            }

            match self.catalog_location(resolver, &location) {
                Ok(encoded) => results.push((location, Artifact::Contents(encoded))),
                Err(CatalogError::Resolver(e)) if e.is_permission_denied() => {
                    debug!(
                        path = %location.virtual_path,
                        error = %e,
                        "permission denied, skipping"
                    );
                    metrics::counter!(
                        CATALOGER_FILES_SKIPPED_TOTAL,
                        LABEL_CATALOGER => "contents-cataloger",
                        LABEL_REASON => "permission",
                    )
                    .increment(1);
                }
                Err(e) => return Err(e),
            }
        }

        debug!(files = results.len(), "contents cataloger processed files");
        Ok(results)
    }
}
