use clap::Args;
use log::debug;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File extensions recognized as rule documents.
pub const RULE_EXTENSIONS: &[&str] = &["yaml", "yml"];

#[derive(Args, Debug)]
pub struct ReaderOpts {
    /// Do not descend into subdirectories when `PATH` is a directory
    #[arg(long)]
    pub no_recurse: bool,

    /// A rule document, or a directory to search for `.yaml` and `.yml` documents
    pub path: PathBuf,
}

impl ReaderOpts {
    /// Find every rule document named by the options. This is a convenience method around
    /// [read_rule_paths].
    pub fn read_rule_paths(&self) -> Result<Vec<PathBuf>> {
        read_rule_paths(&self.path, !self.no_recurse)
    }
}

/// Collect rule document paths under `path`, sorted so output is stable.
///
/// A file is returned as-is whatever its extension. For a directory only files with one of the
/// [RULE_EXTENSIONS] are returned, descending into subdirectories when `recurse` is true.
pub fn read_rule_paths(path: impl AsRef<Path>, recurse: bool) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let metadata =
        std::fs::metadata(path).with_context(|| format!("reading {}", path.display()))?;
    if metadata.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut paths = vec![];
    collect_dir(path, recurse, &mut paths)?;
    paths.sort();
    Ok(paths)
}

fn collect_dir(dir: &Path, recurse: bool, paths: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        let p = entry.path();
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            if recurse {
                collect_dir(&p, true, paths)?;
            }
        } else if metadata.is_file() && has_rule_extension(&p) {
            paths.push(p);
        } else {
            debug!("skipping {}", p.display());
        }
    }
    Ok(())
}

fn has_rule_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            RULE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
