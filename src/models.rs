use serde::{Deserialize, Serialize};

/// Canonical, platform-independent description of an installed application.
///
/// Every scanner normalizes its raw records into this shape; the risk engine
/// only ever sees `AppInfo`. Usage-score fields follow a `[0.0, 1.0]`
/// convention maintained by the producers, not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    pub package_name: String,
    pub app_name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_system_app: bool,
    #[serde(default = "default_true")]
    pub has_launcher_icon: bool,
    #[serde(default = "default_true", alias = "installed_from_play_store")]
    pub installed_from_trusted_source: bool,
    #[serde(default)]
    pub uses_accessibility_service: bool,
    #[serde(default)]
    pub uses_media_projection: bool,
    #[serde(default)]
    pub has_overlay_permission: bool,
    #[serde(default)]
    pub foreground_service_usage_score: f64,
    #[serde(default)]
    pub background_network_usage_score: f64,
    /// Passthrough metadata from sources that provide it; opaque to scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_location: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for AppInfo {
    fn default() -> Self {
        AppInfo {
            package_name: String::new(),
            app_name: String::new(),
            permissions: Vec::new(),
            is_system_app: false,
            has_launcher_icon: true,
            installed_from_trusted_source: true,
            uses_accessibility_service: false,
            uses_media_projection: false,
            has_overlay_permission: false,
            foreground_service_usage_score: 0.0,
            background_network_usage_score: 0.0,
            publisher: None,
            install_location: None,
        }
    }
}

/// An [`AppInfo`] plus the derived risk fields. Immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredApp {
    #[serde(flatten)]
    pub app: AppInfo,
    /// Always within `[0, 100]` after scoring.
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    /// One entry per triggered rule, in rule-evaluation order.
    pub risk_reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier for a clamped score: High ≥ 70, Medium ≥ 40, Low below.
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            RiskLevel::High
        } else if score >= 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Pre-tagged JSON records carrying canonical fields directly.
    Snapshot,
    /// Windows registry uninstall export; signals are inferred heuristically.
    Registry,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Snapshot => write!(f, "snapshot"),
            SourceKind::Registry => write!(f, "registry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_app_serializes_flat() {
        let scored = ScoredApp {
            app: AppInfo {
                package_name: "com.example.app".to_string(),
                app_name: "Example".to_string(),
                ..AppInfo::default()
            },
            risk_score: 42.0,
            risk_level: RiskLevel::Medium,
            risk_reasons: vec!["reason one".to_string()],
        };

        let json: serde_json::Value = serde_json::to_value(&scored).unwrap();
        // Flat field set: AppInfo fields sit beside the risk fields.
        assert_eq!(json["package_name"], "com.example.app");
        assert_eq!(json["risk_score"], 42.0);
        assert_eq!(json["risk_level"], "Medium");
        assert_eq!(json["risk_reasons"][0], "reason one");
        assert!(json.get("app").is_none());
        // Absent passthrough metadata is omitted entirely.
        assert!(json.get("publisher").is_none());
    }

    #[test]
    fn test_app_info_accepts_legacy_field_name() {
        let app: AppInfo = serde_json::from_str(
            r#"{"package_name": "p", "app_name": "A", "installed_from_play_store": false}"#,
        )
        .unwrap();
        assert!(!app.installed_from_trusted_source);
    }
}
