use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

/// Root configuration structure, deserialized from `.spyscan/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Lexicons driving the registry-heuristic normalizer.
    #[serde(default)]
    pub heuristics: Heuristics,
}

/// String fragments used by the registry scanner's case-insensitive
/// substring heuristics. The built-in defaults are the tool's fixed
/// behavior; a config file can extend or replace them.
#[derive(Debug, Clone, Deserialize)]
pub struct Heuristics {
    /// Publisher fragments treated as a trusted install source.
    #[serde(default = "default_trusted_publishers")]
    pub trusted_publishers: Vec<String>,
    /// Display-name keywords marking remote-access / monitoring tools.
    #[serde(default = "default_suspicious_keywords")]
    pub suspicious_keywords: Vec<String>,
    /// Stricter sub-check: suspicious names also containing one of these are
    /// assumed to capture the screen.
    #[serde(default = "default_screen_capture_tokens")]
    pub screen_capture_tokens: Vec<String>,
    /// Install-path prefixes marking system-owned applications.
    #[serde(default = "default_system_path_prefixes")]
    pub system_path_prefixes: Vec<String>,
    /// Publisher fragments marking first-party system vendors.
    #[serde(default = "default_system_publisher_tokens")]
    pub system_publisher_tokens: Vec<String>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Heuristics {
            trusted_publishers: default_trusted_publishers(),
            suspicious_keywords: default_suspicious_keywords(),
            screen_capture_tokens: default_screen_capture_tokens(),
            system_path_prefixes: default_system_path_prefixes(),
            system_publisher_tokens: default_system_publisher_tokens(),
        }
    }
}

fn default_trusted_publishers() -> Vec<String> {
    [
        "Microsoft Corporation",
        "Google LLC",
        "Google Inc.",
        "Adobe",
        "Intel Corporation",
        "NVIDIA Corporation",
        "Oracle Corporation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_suspicious_keywords() -> Vec<String> {
    [
        "remote",
        "viewer",
        "anydesk",
        "teamviewer",
        "monitor",
        "spy",
        "tracker",
        "keylogger",
        "assistant",
        "control",
        "screen",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_screen_capture_tokens() -> Vec<String> {
    ["screen", "remote", "viewer"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_system_path_prefixes() -> Vec<String> {
    vec![r"c:\windows".to_string()]
}

fn default_system_publisher_tokens() -> Vec<String> {
    vec!["microsoft".to_string()]
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<scan_path>/.spyscan/config.toml`
/// 3. `~/.config/spyscan/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(scan_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        let content = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&content)?);
    }

    let local_config = scan_path.join(".spyscan").join("config.toml");
    if local_config.exists() {
        let content = std::fs::read_to_string(&local_config)?;
        return Ok(toml::from_str(&content)?);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("spyscan").join("config.toml");
        if home_config.exists() {
            let content = std::fs::read_to_string(&home_config)?;
            return Ok(toml::from_str(&content)?);
        }
    }

    Ok(Config::default())
}
