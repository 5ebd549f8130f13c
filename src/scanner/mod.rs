use std::path::Path;

use anyhow::Result;

use crate::models::AppInfo;

pub mod registry;
pub mod snapshot;

/// A per-source normalizer: reads one raw source file and maps every usable
/// record into the canonical [`AppInfo`] model. Individual malformed records
/// are skipped, never failing the batch; a missing source yields an empty
/// set.
pub trait Scanner {
    fn scan(&self, path: &Path) -> Result<Vec<AppInfo>>;
}
