//! cataloger 계약과 실행기
//!
//! [`Cataloger`]는 하나의 [`FileResolver`]를 소비하여 Location 기준
//! 아티팩트 집합을 만드는 추출 계약입니다. 여러 cataloger가 같은
//! resolver를 대상으로 실행되며, 각각 독립적입니다. cataloger는 소스에
//! 부작용을 남기지 않습니다 (읽기 전용).

use tracing::{debug, info};

use drydock_core::catalog::{Artifact, Catalog};
use drydock_core::types::{Location, Scope, SourceMetadata};
use drydock_source::FileResolver;

use crate::error::CatalogError;

/// 추출 계약
///
/// 파일 고유의 실패(권한 거부)는 파일 단위 스킵으로 복구해야 하며,
/// 그 외의 resolver 실패는 치명적이므로 그대로 전파합니다. 결과에는
/// 성공적으로 추출된 Location만 나타납니다 — 스킵된 파일은 에러
/// 마커 없이 빠집니다.
pub trait Cataloger: Send + Sync {
    /// cataloger 이름 (로깅/진단용)
    fn name(&self) -> &str;

    /// resolver에서 아티팩트를 추출합니다.
    ///
    /// 반환 집합의 Location은 동등성 기준으로 유일합니다.
    fn catalog(
        &self,
        resolver: &dyn FileResolver,
    ) -> Result<Vec<(Location, Artifact)>, CatalogError>;
}

/// 구성된 모든 cataloger를 실행하여 [`Catalog`]로 집계합니다.
///
/// cataloger는 순차 실행되며, 하나의 치명적 실패가 전체 실행을
/// 중단시킵니다.
pub fn catalog_source(
    source: SourceMetadata,
    scope: Scope,
    resolver: &dyn FileResolver,
    catalogers: &[Box<dyn Cataloger>],
) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::new(source, scope);

    for cataloger in catalogers {
        debug!(cataloger = cataloger.name(), "running cataloger");
        let results = cataloger.catalog(resolver)?;

        metrics::counter!(
            drydock_core::metrics::CATALOGER_FILES_CATALOGED_TOTAL,
            drydock_core::metrics::LABEL_CATALOGER => cataloger.name().to_owned(),
        )
        .increment(results.len() as u64);

        debug!(
            cataloger = cataloger.name(),
            artifacts = results.len(),
            "cataloger finished"
        );
        catalog.extend(results);
    }

    info!(
        locations = catalog.entry_count(),
        artifacts = catalog.artifact_count(),
        "cataloging complete"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryResolver;
    use drydock_core::types::{DirectoryMetadata, Scope};

    fn sample_source() -> SourceMetadata {
        SourceMetadata::Directory(DirectoryMetadata {
            path: "/tmp/proj".to_owned(),
        })
    }

    /// 고정된 결과를 돌려주는 cataloger
    struct FixedCataloger {
        results: Vec<(Location, Artifact)>,
    }

    impl Cataloger for FixedCataloger {
        fn name(&self) -> &str {
            "fixed-cataloger"
        }

        fn catalog(
            &self,
            _resolver: &dyn FileResolver,
        ) -> Result<Vec<(Location, Artifact)>, CatalogError> {
            Ok(self.results.clone())
        }
    }

    /// 항상 실패하는 cataloger
    struct FailingCataloger;

    impl Cataloger for FailingCataloger {
        fn name(&self) -> &str {
            "failing-cataloger"
        }

        fn catalog(
            &self,
            _resolver: &dyn FileResolver,
        ) -> Result<Vec<(Location, Artifact)>, CatalogError> {
            Err(CatalogError::Cataloger {
                name: "failing-cataloger".to_owned(),
                reason: "boom".to_owned(),
            })
        }
    }

    #[test]
    fn catalog_source_merges_cataloger_results() {
        let resolver = MemoryResolver::new();
        let catalogers: Vec<Box<dyn Cataloger>> = vec![
            Box::new(FixedCataloger {
                results: vec![(
                    Location::new("a.txt", "a.txt"),
                    Artifact::Contents("YQ==".to_owned()),
                )],
            }),
            Box::new(FixedCataloger {
                results: vec![(
                    Location::new("a.txt", "a.txt"),
                    Artifact::Digests(vec![]),
                )],
            }),
        ];

        let catalog =
            catalog_source(sample_source(), Scope::Squashed, &resolver, &catalogers).unwrap();

        // 두 cataloger의 아티팩트가 같은 Location 엔트리로 합쳐진다
        assert_eq!(catalog.entry_count(), 1);
        assert_eq!(catalog.artifact_count(), 2);
        assert_eq!(catalog.scope, Scope::Squashed);
    }

    #[test]
    fn catalog_source_empty_catalogers_yields_empty_catalog() {
        let resolver = MemoryResolver::new();
        let catalog = catalog_source(sample_source(), Scope::Squashed, &resolver, &[]).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn cataloger_failure_aborts_the_run() {
        let resolver = MemoryResolver::new();
        let catalogers: Vec<Box<dyn Cataloger>> = vec![Box::new(FailingCataloger)];

        let err =
            catalog_source(sample_source(), Scope::Squashed, &resolver, &catalogers).unwrap_err();
        assert!(matches!(err, CatalogError::Cataloger { .. }));
    }
}
