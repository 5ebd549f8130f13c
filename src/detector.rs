use std::path::{Path, PathBuf};

use crate::models::SourceKind;

/// One raw-record source file to scan.
#[derive(Debug, Clone)]
pub struct Source {
    pub path: PathBuf,
    pub kind: SourceKind,
}

/// Auto-detect source files by extension: `.json` snapshots and `.reg`
/// registry exports.
///
/// A file path yields at most one source; a directory is scanned one level
/// deep. The result order is deterministic (snapshots before registry
/// exports, each group sorted by file name) so downstream merging does not
/// depend on directory enumeration order.
pub fn detect_sources(path: &Path) -> Vec<Source> {
    if path.is_file() {
        return classify(path).into_iter().collect();
    }

    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };

    let mut sources: Vec<Source> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .filter_map(|p| classify(&p))
        .collect();

    sources.sort_by_key(|s| (s.kind != SourceKind::Snapshot, s.path.clone()));
    sources
}

fn classify(path: &Path) -> Option<Source> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let kind = match ext.as_str() {
        "json" => SourceKind::Snapshot,
        "reg" => SourceKind::Registry,
        _ => return None,
    };
    Some(Source {
        path: path.to_path_buf(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_detection_is_ordered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["machine.reg", "apps.json", "user.reg", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let sources = detect_sources(dir.path());
        let names: Vec<String> = sources
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["apps.json", "machine.reg", "user.reg"]);
        assert_eq!(sources[0].kind, SourceKind::Snapshot);
        assert_eq!(sources[1].kind, SourceKind::Registry);
    }

    #[test]
    fn test_single_file_detection() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("export.REG");
        std::fs::write(&file, "").unwrap();

        let sources = detect_sources(&file);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].kind, SourceKind::Registry);
    }

    #[test]
    fn test_unknown_extension_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("apps.csv");
        std::fs::write(&file, "").unwrap();
        assert!(detect_sources(&file).is_empty());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        assert!(detect_sources(Path::new("/nonexistent/dir")).is_empty());
    }
}
