//! The merge program's output protocol.
//!
//! A successful run prints a line containing `SUCCESS:` followed by the path
//! of the merged file. Everything else on stdout/stderr is diagnostic noise.

use std::path::PathBuf;

pub const SUCCESS_MARKER: &str = "SUCCESS:";

/// Extracts the announced output path from the first line carrying the
/// success marker. A marker with nothing after it does not count.
pub fn parse_success_marker(output: &str) -> Option<PathBuf> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once(SUCCESS_MARKER)?;
        let path = rest.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    })
}
