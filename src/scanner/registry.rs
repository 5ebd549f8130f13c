use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::config::Heuristics;
use crate::models::AppInfo;

/// Uninstall locations recognized in an export, in merge priority order.
/// Entries from an earlier location win (name, publisher) de-duplication
/// regardless of where they appear in the file.
const UNINSTALL_LOCATIONS: &[&str] = &[
    r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKEY_CURRENT_USER\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKEY_LOCAL_MACHINE\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
];

/// Scanner for Windows registry uninstall exports (`.reg` text files).
///
/// The export carries only a display name, a publisher, and an install path
/// per application, with no permission or behavioral signal, so this scanner
/// infers the canonical fields heuristically: vendor fragments mark system
/// and trusted apps, and remote-access keywords in the display name drive
/// the suspicion scores.
pub struct RegistryScanner {
    heuristics: Heuristics,
}

#[derive(Debug, Clone)]
struct RawEntry {
    location: usize,
    subkey: String,
    display_name: String,
    publisher: String,
    install_location: String,
}

impl RegistryScanner {
    pub fn new(heuristics: Heuristics) -> Self {
        Self { heuristics }
    }

    /// Map one raw uninstall entry into the canonical model.
    fn normalize(&self, raw: &RawEntry) -> AppInfo {
        let h = &self.heuristics;
        let lower_name = raw.display_name.to_lowercase();
        let lower_publisher = raw.publisher.to_lowercase();
        let lower_location = raw.install_location.to_lowercase();

        // The subkey is the stable identifier; a nameless subkey falls back
        // to a display-name-derived key (unique only if names are).
        let package_name = if raw.subkey.is_empty() {
            raw.display_name.replace(' ', "_").to_lowercase()
        } else {
            raw.subkey.clone()
        };

        let is_system_app = h
            .system_publisher_tokens
            .iter()
            .any(|t| lower_publisher.contains(&t.to_lowercase()))
            || h.system_path_prefixes
                .iter()
                .any(|p| lower_location.starts_with(&p.to_lowercase()));

        let installed_from_trusted_source = h
            .trusted_publishers
            .iter()
            .any(|t| lower_publisher.contains(&t.to_lowercase()));

        let suspicious = h
            .suspicious_keywords
            .iter()
            .any(|k| lower_name.contains(&k.to_lowercase()));

        let mut foreground_score = 0.0;
        let mut background_score = 0.0;
        let mut uses_media_projection = false;
        if suspicious {
            foreground_score = 0.8;
            background_score = 0.6;
            uses_media_projection = h
                .screen_capture_tokens
                .iter()
                .any(|t| lower_name.contains(&t.to_lowercase()));
        }

        AppInfo {
            package_name,
            app_name: raw.display_name.clone(),
            // This source cannot observe permissions, accessibility use, or
            // overlays; those stay at their defaults.
            permissions: Vec::new(),
            is_system_app,
            has_launcher_icon: true,
            installed_from_trusted_source,
            uses_accessibility_service: false,
            uses_media_projection,
            has_overlay_permission: false,
            foreground_service_usage_score: foreground_score,
            background_network_usage_score: background_score,
            publisher: Some(raw.publisher.clone()).filter(|p| !p.is_empty()),
            install_location: Some(raw.install_location.clone()).filter(|l| !l.is_empty()),
        }
    }
}

impl super::Scanner for RegistryScanner {
    fn scan(&self, path: &Path) -> Result<Vec<AppInfo>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let bytes = std::fs::read(path)?;
        let content = decode_export(&bytes);
        let entries = parse_export(&content)?;

        // Deterministic merge: concatenate by location priority, then drop
        // (name, publisher) duplicates, first-seen wins.
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut apps = Vec::new();
        for location in 0..UNINSTALL_LOCATIONS.len() {
            for raw in entries.iter().filter(|e| e.location == location) {
                let key = (raw.display_name.clone(), raw.publisher.clone());
                if !seen.insert(key) {
                    debug!(name = %raw.display_name, "dropping duplicate uninstall entry");
                    continue;
                }
                apps.push(self.normalize(raw));
            }
        }

        Ok(apps)
    }
}

/// Parse the text of a registry export into raw uninstall entries, in file
/// order. Sections outside the known uninstall locations, nested deeper than
/// one subkey, or missing a `DisplayName` are skipped; non-string values
/// (`dword:`, `hex:`) are ignored.
fn parse_export(content: &str) -> Result<Vec<RawEntry>> {
    let section_re = Regex::new(r"^\[-?(.+)\]\s*$")?;
    let value_re = Regex::new(r#"^"((?:\\.|[^"\\])*)"\s*=\s*(.*)$"#)?;

    let mut entries = Vec::new();
    let mut current: Option<PendingEntry> = None;

    for line in content.lines() {
        let line = line.trim_end();

        if let Some(caps) = section_re.captures(line.trim_start()) {
            flush(&mut current, &mut entries);
            current = classify_section(&caps[1]).map(|(location, subkey)| PendingEntry {
                location,
                subkey,
                display_name: None,
                publisher: String::new(),
                install_location: String::new(),
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        let Some(caps) = value_re.captures(line.trim_start()) else {
            continue;
        };

        let name = unescape(&caps[1]);
        let rest = caps[2].trim();
        // Only REG_SZ values matter here.
        if rest.len() < 2 || !rest.starts_with('"') || !rest.ends_with('"') {
            continue;
        }
        let value = unescape(&rest[1..rest.len() - 1]);

        if name.eq_ignore_ascii_case("DisplayName") {
            entry.display_name = Some(value);
        } else if name.eq_ignore_ascii_case("Publisher") {
            entry.publisher = value;
        } else if name.eq_ignore_ascii_case("InstallLocation") {
            entry.install_location = value;
        }
    }
    flush(&mut current, &mut entries);

    Ok(entries)
}

#[derive(Debug)]
struct PendingEntry {
    location: usize,
    subkey: String,
    display_name: Option<String>,
    publisher: String,
    install_location: String,
}

fn flush(current: &mut Option<PendingEntry>, entries: &mut Vec<RawEntry>) {
    let Some(pending) = current.take() else {
        return;
    };
    match pending.display_name {
        // Entries without a visible name are not installed applications the
        // user could recognize; skip them like the platform does.
        None => debug!(subkey = %pending.subkey, "skipping uninstall entry without DisplayName"),
        Some(display_name) => entries.push(RawEntry {
            location: pending.location,
            subkey: pending.subkey,
            display_name,
            publisher: pending.publisher,
            install_location: pending.install_location,
        }),
    }
}

/// Match a section path against the known uninstall locations; returns the
/// location's priority index and the direct subkey name.
fn classify_section(section: &str) -> Option<(usize, String)> {
    let bytes = section.as_bytes();
    for (idx, location) in UNINSTALL_LOCATIONS.iter().enumerate() {
        let loc = location.as_bytes();
        if bytes.len() > loc.len() + 1
            && bytes[..loc.len()].eq_ignore_ascii_case(loc)
            && bytes[loc.len()] == b'\\'
        {
            // The matched prefix is pure ASCII, so this slice is sound even
            // for non-ASCII subkey names.
            let rest = &section[loc.len() + 1..];
            if !rest.is_empty() && !rest.contains('\\') {
                return Some((idx, rest.to_string()));
            }
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Registry exports are usually UTF-16LE with a BOM; older REGEDIT4 exports
/// and hand-made fixtures are plain 8-bit text.
fn decode_export(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_EXPORT: &str = r#"Windows Registry Editor Version 5.00

[HKEY_CURRENT_USER\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\remoteviewer-user]
"DisplayName"="RemoteViewer Pro"
"Publisher"="Unknown Co"

[HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\{7Z-1001}]
"DisplayName"="7-Zip 22.01"
"Publisher"="Igor Pavlov"
"InstallLocation"="C:\\Program Files\\7-Zip\\"
"EstimatedSize"=dword:000013a8

[HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\remoteviewer-machine]
"DisplayName"="RemoteViewer Pro"
"Publisher"="Unknown Co"

[HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\{EDGE}]
"DisplayName"="Microsoft Edge"
"Publisher"="Microsoft Corporation"
"InstallLocation"="C:\\Program Files (x86)\\Microsoft\\Edge\\"

[HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\{NAMELESS}]
"Publisher"="Ghost Corp"

[HKEY_LOCAL_MACHINE\SOFTWARE\SomethingElse\{UNRELATED}]
"DisplayName"="Not An Uninstall Entry"
"#;

    fn scanner() -> RegistryScanner {
        RegistryScanner::new(Heuristics::default())
    }

    fn scan_text(content: &str) -> Vec<AppInfo> {
        let mut f = NamedTempFile::with_suffix(".reg").unwrap();
        f.write_all(content.as_bytes()).unwrap();
        scanner().scan(f.path()).unwrap()
    }

    #[test]
    fn test_parse_skips_unrelated_and_nameless_sections() {
        let entries = parse_export(SAMPLE_EXPORT).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.display_name != "Not An Uninstall Entry"));
        assert!(entries.iter().all(|e| e.subkey != "{NAMELESS}"));
    }

    #[test]
    fn test_location_priority_beats_file_order() {
        // The HKCU RemoteViewer entry comes first in the file, but HKLM has
        // higher merge priority, so its duplicate survives de-duplication.
        let apps = scan_text(SAMPLE_EXPORT);
        let viewers: Vec<_> = apps.iter().filter(|a| a.app_name == "RemoteViewer Pro").collect();
        assert_eq!(viewers.len(), 1);
        assert_eq!(viewers[0].package_name, "remoteviewer-machine");
    }

    #[test]
    fn test_suspicious_name_heuristics() {
        let apps = scan_text(SAMPLE_EXPORT);
        let viewer = apps.iter().find(|a| a.app_name == "RemoteViewer Pro").unwrap();
        assert!(!viewer.is_system_app);
        assert!(!viewer.installed_from_trusted_source);
        assert!(viewer.uses_media_projection);
        assert_eq!(viewer.foreground_service_usage_score, 0.8);
        assert_eq!(viewer.background_network_usage_score, 0.6);
        assert!(viewer.permissions.is_empty());
        assert!(!viewer.uses_accessibility_service);
        assert!(!viewer.has_overlay_permission);
    }

    #[test]
    fn test_benign_entry_stays_quiet() {
        let apps = scan_text(SAMPLE_EXPORT);
        let seven_zip = apps.iter().find(|a| a.app_name == "7-Zip 22.01").unwrap();
        assert_eq!(seven_zip.package_name, "{7Z-1001}");
        assert!(!seven_zip.is_system_app);
        assert!(!seven_zip.installed_from_trusted_source);
        assert_eq!(seven_zip.foreground_service_usage_score, 0.0);
        assert!(!seven_zip.uses_media_projection);
        assert_eq!(
            seven_zip.install_location.as_deref(),
            Some(r"C:\Program Files\7-Zip\")
        );
    }

    #[test]
    fn test_vendor_publisher_marks_system_and_trusted() {
        let apps = scan_text(SAMPLE_EXPORT);
        let edge = apps.iter().find(|a| a.app_name == "Microsoft Edge").unwrap();
        assert!(edge.is_system_app);
        assert!(edge.installed_from_trusted_source);
    }

    #[test]
    fn test_windows_directory_marks_system() {
        let apps = scan_text(
            r#"[HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\{SYS}]
"DisplayName"="Bundled Component"
"Publisher"="Someone"
"InstallLocation"="C:\\Windows\\System32\\thing\\"
"#,
        );
        assert!(apps[0].is_system_app);
        assert!(!apps[0].installed_from_trusted_source);
    }

    #[test]
    fn test_suspicious_without_screen_token_keeps_projection_off() {
        let apps = scan_text(
            r#"[HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\{TRK}]
"DisplayName"="FitnessTracker"
"Publisher"="Health Co"
"#,
        );
        assert_eq!(apps[0].foreground_service_usage_score, 0.8);
        assert!(!apps[0].uses_media_projection);
    }

    #[test]
    fn test_nameless_subkey_falls_back_to_derived_package() {
        let raw = RawEntry {
            location: 0,
            subkey: String::new(),
            display_name: "Acme Screen Helper".to_string(),
            publisher: String::new(),
            install_location: String::new(),
        };
        let app = scanner().normalize(&raw);
        assert_eq!(app.package_name, "acme_screen_helper");
    }

    #[test]
    fn test_utf16le_export_decodes() {
        let text = "Windows Registry Editor Version 5.00\r\n\r\n\
[HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\{U16}]\r\n\
\"DisplayName\"=\"Wide App\"\r\n";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let mut f = NamedTempFile::with_suffix(".reg").unwrap();
        f.write_all(&bytes).unwrap();

        let apps = scanner().scan(f.path()).unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].app_name, "Wide App");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let apps = scanner().scan(Path::new("/nonexistent/export.reg")).unwrap();
        assert!(apps.is_empty());
    }
}
