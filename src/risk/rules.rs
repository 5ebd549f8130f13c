use crate::models::AppInfo;

/// One triggered rule: a signed score contribution and its explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub delta: f64,
    pub reason: String,
}

/// A scoring rule. Rules are independent: none reads another's outcome, so
/// chain order only determines the order of reasons, never the final score.
pub type Rule = fn(&AppInfo) -> Vec<RuleHit>;

/// The fixed evaluation order. Core capabilities, then sensitive permissions,
/// then behavioral thresholds, then trust modifiers.
pub const CHAIN: &[Rule] = &[
    screen_capture,
    accessibility_service,
    overlay,
    sensitive_permissions,
    foreground_services,
    background_network,
    system_app,
    trusted_source,
    hidden_app,
];

/// Sensitive permission weights, keyed by the bare permission name.
pub const PERMISSION_WEIGHTS: &[(&str, f64)] = &[
    ("READ_SMS", 10.0),
    ("SYSTEM_ALERT_WINDOW", 10.0),
    ("RECEIVE_SMS", 8.0),
    ("READ_CALL_LOG", 8.0),
    ("RECORD_AUDIO", 8.0),
    ("CAMERA", 5.0),
    ("READ_CONTACTS", 5.0),
    ("READ_PHONE_STATE", 5.0),
    ("CALL_PHONE", 4.0),
    ("ACCESS_FINE_LOCATION", 3.0),
    ("ACCESS_COARSE_LOCATION", 2.0),
];

fn single(delta: f64, reason: &str) -> Vec<RuleHit> {
    vec![RuleHit {
        delta,
        reason: reason.to_string(),
    }]
}

fn screen_capture(app: &AppInfo) -> Vec<RuleHit> {
    if app.uses_media_projection {
        single(30.0, "Uses MediaProjection / screen capture capability.")
    } else {
        Vec::new()
    }
}

fn accessibility_service(app: &AppInfo) -> Vec<RuleHit> {
    if app.uses_accessibility_service {
        single(25.0, "Runs an Accessibility Service (can read screen content).")
    } else {
        Vec::new()
    }
}

fn overlay(app: &AppInfo) -> Vec<RuleHit> {
    if app.has_overlay_permission {
        single(15.0, "Has overlay (draw over other apps) permission.")
    } else {
        Vec::new()
    }
}

/// One hit per weighted permission, in the order permissions appear in the
/// input list. A permission matches on its final dot-separated segment, so
/// `android.permission.READ_SMS` and `READ_SMS` carry the same weight.
fn sensitive_permissions(app: &AppInfo) -> Vec<RuleHit> {
    app.permissions
        .iter()
        .filter_map(|perm| {
            let bare = perm.rsplit('.').next().unwrap_or(perm);
            PERMISSION_WEIGHTS
                .iter()
                .find(|(name, _)| *name == bare)
                .map(|(_, weight)| RuleHit {
                    delta: *weight,
                    reason: format!("Uses sensitive permission: {} (+{}).", perm, weight),
                })
        })
        .collect()
}

fn foreground_services(app: &AppInfo) -> Vec<RuleHit> {
    if app.foreground_service_usage_score > 0.7 {
        single(
            10.0,
            "Runs long-lived foreground services frequently (possible background spying).",
        )
    } else if app.foreground_service_usage_score > 0.4 {
        single(5.0, "Moderate use of foreground services (needs review).")
    } else {
        Vec::new()
    }
}

fn background_network(app: &AppInfo) -> Vec<RuleHit> {
    if app.background_network_usage_score > 0.7 {
        single(
            10.0,
            "High background network usage (sending data while not in active use).",
        )
    } else if app.background_network_usage_score > 0.4 {
        single(5.0, "Moderate background network usage (monitor if unexpected).")
    } else {
        Vec::new()
    }
}

fn system_app(app: &AppInfo) -> Vec<RuleHit> {
    if app.is_system_app {
        single(-10.0, "System app: slightly reduced risk (still monitor for abuse).")
    } else {
        Vec::new()
    }
}

fn trusted_source(app: &AppInfo) -> Vec<RuleHit> {
    if app.installed_from_trusted_source {
        single(-5.0, "Installed from a trusted source: slightly reduced risk.")
    } else {
        Vec::new()
    }
}

fn hidden_app(app: &AppInfo) -> Vec<RuleHit> {
    if app.has_launcher_icon {
        Vec::new()
    } else {
        single(10.0, "No launcher icon: app may be trying to hide from the user.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn untrusted() -> AppInfo {
        AppInfo {
            installed_from_trusted_source: false,
            ..AppInfo::default()
        }
    }

    #[test]
    fn test_capability_rules_fire_independently() {
        let mut app = untrusted();
        app.uses_media_projection = true;
        assert_eq!(screen_capture(&app)[0].delta, 30.0);
        assert!(accessibility_service(&app).is_empty());
        assert!(overlay(&app).is_empty());

        app.uses_accessibility_service = true;
        app.has_overlay_permission = true;
        assert_eq!(accessibility_service(&app)[0].delta, 25.0);
        assert_eq!(overlay(&app)[0].delta, 15.0);
    }

    #[test]
    fn test_permission_weights_in_input_order() {
        let mut app = untrusted();
        app.permissions = vec![
            "CAMERA".to_string(),
            "READ_SMS".to_string(),
            "BLUETOOTH".to_string(),
        ];
        let hits = sensitive_permissions(&app);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].delta, 5.0);
        assert_eq!(hits[1].delta, 10.0);
    }

    #[test]
    fn test_permission_matches_prefixed_names() {
        let mut app = untrusted();
        app.permissions = vec!["android.permission.RECORD_AUDIO".to_string()];
        let hits = sensitive_permissions(&app);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].delta, 8.0);
        assert!(hits[0].reason.contains("android.permission.RECORD_AUDIO"));
    }

    #[test]
    fn test_behavioral_tiers_are_mutually_exclusive() {
        let mut app = untrusted();
        app.foreground_service_usage_score = 0.8;
        assert_eq!(foreground_services(&app)[0].delta, 10.0);

        app.foreground_service_usage_score = 0.5;
        assert_eq!(foreground_services(&app)[0].delta, 5.0);

        app.foreground_service_usage_score = 0.4;
        assert!(foreground_services(&app).is_empty());

        app.background_network_usage_score = 0.71;
        assert_eq!(background_network(&app)[0].delta, 10.0);
    }

    #[test]
    fn test_trust_modifiers() {
        let mut app = untrusted();
        app.is_system_app = true;
        assert_eq!(system_app(&app)[0].delta, -10.0);
        assert!(trusted_source(&app).is_empty());

        app.installed_from_trusted_source = true;
        assert_eq!(trusted_source(&app)[0].delta, -5.0);

        app.has_launcher_icon = false;
        assert_eq!(hidden_app(&app)[0].delta, 10.0);
    }
}
