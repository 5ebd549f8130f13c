use std::path::Path;

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::AppInfo;

/// Scanner for structured snapshot files: a JSON array of flat records
/// already carrying canonical field names (Android-style inventories).
///
/// Records are duck-typed: absent fields take the documented defaults,
/// unknown fields are ignored, and usage scores coerce from numbers or
/// string numerals. Ambiguity never crosses this boundary; the output is
/// always a fully-populated [`AppInfo`].
pub struct SnapshotScanner;

impl SnapshotScanner {
    pub fn new() -> Self {
        Self
    }
}

impl super::Scanner for SnapshotScanner {
    fn scan(&self, path: &Path) -> Result<Vec<AppInfo>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path)?;
        let root: Value = serde_json::from_str(&content)?;
        let items = root
            .as_array()
            .ok_or_else(|| anyhow!("snapshot root must be a JSON array: {}", path.display()))?;

        let mut apps = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            match item.as_object() {
                Some(record) => apps.push(normalize_record(record)),
                None => debug!(index = idx, "skipping non-object snapshot record"),
            }
        }

        Ok(apps)
    }
}

/// Build a canonical record from a loose field mapping, applying per-field
/// defaults.
pub fn normalize_record(record: &Map<String, Value>) -> AppInfo {
    AppInfo {
        package_name: string_field(record, "package_name"),
        app_name: string_field(record, "app_name"),
        permissions: permission_list(record),
        is_system_app: bool_field(record, "is_system_app", false),
        has_launcher_icon: bool_field(record, "has_launcher_icon", true),
        installed_from_trusted_source: trusted_source_field(record),
        uses_accessibility_service: bool_field(record, "uses_accessibility_service", false),
        uses_media_projection: bool_field(record, "uses_media_projection", false),
        has_overlay_permission: bool_field(record, "has_overlay_permission", false),
        foreground_service_usage_score: score_field(record, "foreground_service_usage_score"),
        background_network_usage_score: score_field(record, "background_network_usage_score"),
        publisher: optional_string_field(record, "publisher"),
        install_location: optional_string_field(record, "install_location"),
    }
}

fn string_field(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn optional_string_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bool_field(record: &Map<String, Value>, key: &str, default: bool) -> bool {
    record.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// `installed_from_trusted_source`, also honoring the legacy snapshot field
/// name `installed_from_play_store`. Defaults to trusted.
fn trusted_source_field(record: &Map<String, Value>) -> bool {
    record
        .get("installed_from_trusted_source")
        .or_else(|| record.get("installed_from_play_store"))
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

fn permission_list(record: &Map<String, Value>) -> Vec<String> {
    record
        .get("permissions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Usage scores coerce from a JSON number or a string numeral; anything else
/// falls back to the 0.0 default.
fn score_field(record: &Map<String, Value>, key: &str) -> f64 {
    match record.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_defaults_for_empty_record() {
        let app = normalize_record(&record("{}"));
        assert_eq!(app.package_name, "");
        assert!(app.permissions.is_empty());
        assert!(!app.is_system_app);
        assert!(app.has_launcher_icon);
        assert!(app.installed_from_trusted_source);
        assert!(!app.uses_media_projection);
        assert_eq!(app.foreground_service_usage_score, 0.0);
        assert!(app.publisher.is_none());
    }

    #[test]
    fn test_full_record_round_trip() {
        let app = normalize_record(&record(
            r#"{
                "package_name": "com.example.watcher",
                "app_name": "Watcher",
                "permissions": ["android.permission.READ_SMS"],
                "is_system_app": true,
                "has_launcher_icon": false,
                "installed_from_trusted_source": false,
                "uses_media_projection": true,
                "foreground_service_usage_score": 0.9,
                "publisher": "Example Corp"
            }"#,
        ));
        assert_eq!(app.package_name, "com.example.watcher");
        assert_eq!(app.permissions.len(), 1);
        assert!(app.is_system_app);
        assert!(!app.has_launcher_icon);
        assert!(!app.installed_from_trusted_source);
        assert!(app.uses_media_projection);
        assert_eq!(app.foreground_service_usage_score, 0.9);
        assert_eq!(app.publisher.as_deref(), Some("Example Corp"));
    }

    #[test]
    fn test_score_coercion_from_string() {
        let app = normalize_record(&record(
            r#"{"foreground_service_usage_score": "0.75",
                "background_network_usage_score": "not a number"}"#,
        ));
        assert_eq!(app.foreground_service_usage_score, 0.75);
        assert_eq!(app.background_network_usage_score, 0.0);
    }

    #[test]
    fn test_legacy_trusted_source_alias() {
        let app = normalize_record(&record(r#"{"installed_from_play_store": false}"#));
        assert!(!app.installed_from_trusted_source);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let app = normalize_record(&record(
            r#"{"app_name": "X", "telemetry_blob": {"a": 1}, "rating": 4.5}"#,
        ));
        assert_eq!(app.app_name, "X");
    }

    #[test]
    fn test_scan_skips_non_object_records() {
        let mut f = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            f,
            r#"[{{"package_name": "a", "app_name": "A"}}, 42, {{"package_name": "b", "app_name": "B"}}]"#
        )
        .unwrap();

        let apps = SnapshotScanner::new().scan(f.path()).unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].package_name, "a");
        assert_eq!(apps[1].package_name, "b");
    }

    #[test]
    fn test_scan_rejects_non_array_root() {
        let mut f = NamedTempFile::with_suffix(".json").unwrap();
        write!(f, r#"{{"package_name": "a"}}"#).unwrap();
        assert!(SnapshotScanner::new().scan(f.path()).is_err());
    }

    #[test]
    fn test_scan_missing_file_is_empty() {
        let apps = SnapshotScanner::new()
            .scan(Path::new("/nonexistent/apps.json"))
            .unwrap();
        assert!(apps.is_empty());
    }
}
