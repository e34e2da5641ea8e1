//! Blocklist file loading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::blocklist::matcher::Blocklist;

/// Error type for blocklist loading.
#[derive(Debug, Error)]
#[error("could not read blocklist file {path}: {source}")]
pub struct BlocklistError {
    path: String,
    #[source]
    source: std::io::Error,
}

/// Load domain rules from a file, one rule per line.
///
/// Lines are trimmed and lowercased; blank lines are skipped.
pub fn load_blocklist(path: &Path) -> Result<Blocklist, BlocklistError> {
    let file = File::open(path).map_err(|source| BlocklistError {
        path: path.display().to_string(),
        source,
    })?;

    let mut rules = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| BlocklistError {
            path: path.display().to_string(),
            source,
        })?;
        rules.push(line);
    }

    let blocklist = Blocklist::from_rules(rules);
    tracing::info!(
        rules = blocklist.len(),
        path = %path.display(),
        "Blocklist loaded"
    );
    Ok(blocklist)
}
