//! Safety checks for report output paths.
//!
//! Reports are written over whatever sits at the output path, so the path is
//! validated before any work starts: it must be a JSON file and must not be
//! one of the snapshots being read.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Resolve a path for comparison, falling back to the path as given when it
/// does not exist yet.
fn resolved(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output must carry a `.json` extension
/// - Output cannot be the same file as any of the input snapshots
pub fn validate_output_path(output: &Path, inputs: &[&Path]) -> Result<()> {
    let is_json = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        bail!(
            "Safety check failed: output file '{}' must have a .json extension",
            output.display()
        );
    }

    let output_resolved = resolved(output);
    for input in inputs {
        if output == *input || output_resolved == resolved(input) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as input '{}'",
                output.display(),
                input.display()
            );
        }
    }

    Ok(())
}
