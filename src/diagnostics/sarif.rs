use serde::Serialize;
use serde_json::json;

use super::diagnostics::{Diagnostic, Severity};

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str =
    "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json";
const RULE_ID: &str = "fence";

#[derive(Serialize)]
struct ArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Region {
    start_line: usize,
    start_column: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhysicalLocation {
    artifact_location: ArtifactLocation,
    region: Region,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    physical_location: PhysicalLocation,
}

#[derive(Serialize)]
struct Message {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    level: &'static str,
    rule_id: &'static str,
    message: Message,
    locations: Vec<Location>,
}

/// Render located diagnostics as a SARIF 2.1.0 report.
///
/// File paths are reported relative to the project root; the line number is
/// carried in `startColumn` with `startLine` pinned to 1.
pub fn render_sarif(diagnostics: &[Diagnostic]) -> serde_json::Value {
    let results: Vec<SarifResult> = diagnostics
        .iter()
        .filter_map(|diagnostic| {
            let file_path = diagnostic.file_path()?;
            Some(SarifResult {
                level: match diagnostic.severity() {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                },
                rule_id: RULE_ID,
                message: Message {
                    text: diagnostic.message(),
                },
                locations: vec![Location {
                    physical_location: PhysicalLocation {
                        artifact_location: ArtifactLocation {
                            uri: file_path.to_string_lossy().to_string(),
                        },
                        region: Region {
                            start_line: 1,
                            start_column: diagnostic.line_number().unwrap_or(1),
                        },
                    },
                }],
            })
        })
        .collect();

    json!({
        "version": SARIF_VERSION,
        "$schema": SARIF_SCHEMA,
        "runs": [{
            "tool": {
                "driver": {
                    "name": RULE_ID,
                    "version": env!("CARGO_PKG_VERSION"),
                }
            },
            "results": serde_json::to_value(results).unwrap_or_default(),
        }]
    })
}
