//! 스캔 결과 렌더링
//!
//! 발행된 [`CatalogReadyEvent`]를 JSON 문서 또는 요약 테이블로
//! 렌더링합니다. JSON 문서의 `source` 필드는 코덱의 tagged-union
//! 봉투 형태를 그대로 사용하므로 나중에 같은 코덱으로 재해석할 수
//! 있습니다.

use anyhow::Result;

use drydock_core::codec::encode_source_metadata;
use drydock_core::event::CatalogReadyEvent;

/// 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// 전체 카탈로그 JSON 문서
    Json,
    /// Location별 요약 테이블
    Table,
}

impl OutputFormat {
    /// 문자열에서 출력 형식을 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

/// 이벤트를 지정한 형식의 문자열로 렌더링합니다.
pub fn render(event: &CatalogReadyEvent, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(event),
        OutputFormat::Table => Ok(render_table(event)),
    }
}

fn render_json(event: &CatalogReadyEvent) -> Result<String> {
    let source = encode_source_metadata(&event.source, event.catalog.scope)?;
    let document = serde_json::json!({
        "source": source,
        "distro": event.distro,
        "artifacts": event.catalog.entries,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

fn render_table(event: &CatalogReadyEvent) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Source: {} (scope: {})\n",
        event.source, event.catalog.scope,
    ));
    if let Some(distro) = &event.distro {
        out.push_str(&format!("Distro: {distro}\n"));
    }
    out.push_str(&format!("{:<60} {:<20}\n", "Location", "Artifacts"));
    out.push_str(&format!("{}\n", "-".repeat(80)));

    for entry in &event.catalog.entries {
        let kinds: Vec<&str> = entry.artifacts.iter().map(|a| a.kind()).collect();
        out.push_str(&format!(
            "{:<60} {:<20}\n",
            entry.location.virtual_path,
            kinds.join(", "),
        ));
    }
    out.push_str(&format!(
        "\n{} locations, {} artifacts\n",
        event.catalog.entry_count(),
        event.catalog.artifact_count(),
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use drydock_core::catalog::{Artifact, Catalog};
    use drydock_core::types::{DirectoryMetadata, Distro, Location, Scope, SourceMetadata};

    fn sample_event() -> CatalogReadyEvent {
        let source = SourceMetadata::Directory(DirectoryMetadata {
            path: "/tmp/proj".to_owned(),
        });
        let mut catalog = Catalog::new(source.clone(), Scope::Squashed);
        catalog.insert(
            Location::new("a.txt", "a.txt"),
            Artifact::Contents("aGVsbG8=".to_owned()),
        );
        CatalogReadyEvent::new(
            source,
            Arc::new(catalog),
            Some(Distro {
                name: "alpine".to_owned(),
                version: "3.19.1".to_owned(),
                id_like: None,
            }),
        )
    }

    #[test]
    fn output_format_from_str_loose() {
        assert_eq!(OutputFormat::from_str_loose("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str_loose("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str_loose("xml"), None);
    }

    #[test]
    fn json_document_embeds_codec_envelope() {
        let rendered = render(&sample_event(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["source"]["type"], "directory");
        assert_eq!(value["source"]["target"], "/tmp/proj");
        assert_eq!(value["distro"]["name"], "alpine");
        assert_eq!(value["artifacts"][0]["location"]["virtual_path"], "a.txt");
    }

    #[test]
    fn table_lists_locations_and_counts() {
        let rendered = render(&sample_event(), OutputFormat::Table).unwrap();
        assert!(rendered.contains("a.txt"));
        assert!(rendered.contains("contents"));
        assert!(rendered.contains("1 locations, 1 artifacts"));
        assert!(rendered.contains("alpine 3.19.1"));
    }
}
