use serde::Serialize;

use crate::analyzer::Finding;
use crate::system::snapshot::{CombinedSnapshot, ProcessSnapshot, SystemSnapshot};

/// Machine-readable document; findings are flattened to glyph-prefixed lines.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub process: &'a ProcessSnapshot,
    pub system: &'a SystemSnapshot,
    pub warnings: Vec<String>,
}

impl<'a> JsonReport<'a> {
    pub fn new(snapshot: &'a CombinedSnapshot, findings: &[Finding]) -> Self {
        JsonReport {
            process: &snapshot.process,
            system: &snapshot.system,
            warnings: findings.iter().map(ToString::to_string).collect(),
        }
    }
}

pub fn render_json(snapshot: &CombinedSnapshot, findings: &[Finding]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::new(snapshot, findings))
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use serde_json::Value;

    use super::*;
    use crate::system::snapshot::ProcessStatus;

    fn snapshot() -> CombinedSnapshot {
        let mut process = ProcessSnapshot::empty(4242);
        process.name = "postgres".into();
        process.status = ProcessStatus::Sleeping;
        process.memory_rss = 2048;
        process.started_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        CombinedSnapshot {
            process,
            system: SystemSnapshot {
                cpu_cores: 8,
                cpu_model: "Test CPU".into(),
                cpu_percent: 12.0,
                memory_total: 100,
                memory_used: 40,
                memory_percent: 40.0,
                memory_free: 60,
            },
            captured_at: DateTime::from_timestamp(1_700_000_100, 0).unwrap(),
        }
    }

    #[test]
    fn document_uses_stable_field_names() {
        let findings = vec![
            Finding::warning("Process is in zombie state"),
            Finding::recommendation("Restart it"),
        ];
        let raw = render_json(&snapshot(), &findings).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(doc["process"]["pid"], 4242);
        assert_eq!(doc["process"]["name"], "postgres");
        assert_eq!(doc["process"]["status"], "sleeping");
        assert_eq!(doc["process"]["memory_rss"], 2048);
        assert_eq!(doc["process"]["create_time"], "2023-11-14T22:13:20Z");
        assert!(doc["process"].get("unavailable").is_none());
        assert_eq!(doc["system"]["cpu_cores"], 8);
        assert_eq!(doc["system"]["cpu_usage"], 12.0);
        assert_eq!(doc["system"]["memory_free"], 60);
        assert_eq!(
            doc["warnings"],
            serde_json::json!(["⚠ Process is in zombie state", "→ Restart it"])
        );
        assert!(doc.get("captured_at").is_none());
    }

    #[test]
    fn empty_findings_serialize_as_empty_array() {
        let raw = render_json(&snapshot(), &[]).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["warnings"], serde_json::json!([]));
    }
}
