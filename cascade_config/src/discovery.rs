//! Discovery of configuration source files within a directory.

use std::path::Path;

use camino::Utf8PathBuf;

use crate::error::{CascadeError, file_error};
use crate::fragment::FragmentResolver;

/// File stem marking a directory's aggregate file.
///
/// The aggregate file merges directly into the enclosing scope; every other
/// eligible file merges under a key derived from its stem.
pub const AGGREGATE_STEM: &str = "index";

/// One discovered configuration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: Utf8PathBuf,
    /// Key the fragment merges under; `None` for the aggregate file, which
    /// merges at the top level.
    pub key: Option<String>,
}

/// Reports whether `path` exists and is a directory.
///
/// Never errors: a missing, inaccessible or non-directory path all report
/// `false`, so both "missing" and "unreadable" degrade to "no configuration
/// here".
#[must_use]
pub fn is_directory(path: &Path) -> bool {
    std::fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false)
}

/// Lists the eligible configuration sources of `dir` in merge order.
///
/// Returns an empty sequence when `dir` is not a directory. Eligibility is
/// delegated to `resolver`; entries that are not regular files and file names
/// that are not UTF-8 are omitted. The aggregate file, when present and
/// `include_aggregate` is set, is placed first so sibling files can override
/// its settings; named files follow sorted by file name, which keeps repeated
/// scans of an unchanged directory deterministic.
///
/// # Errors
///
/// Returns a [`CascadeError`] when the directory listing itself fails, which
/// can only happen after `dir` was observed to be a directory.
pub fn discover(
    dir: &Path,
    resolver: &dyn FragmentResolver,
    include_aggregate: bool,
) -> Result<Vec<SourceFile>, CascadeError> {
    if !is_directory(dir) {
        return Ok(Vec::new());
    }
    let canonical = std::fs::canonicalize(dir).map_err(|e| file_error(dir, e))?;

    let mut aggregates = Vec::new();
    let mut named = Vec::new();
    for entry in std::fs::read_dir(&canonical).map_err(|e| file_error(&canonical, e))? {
        let dir_entry = entry.map_err(|e| file_error(&canonical, e))?;
        let entry_path = dir_entry.path();
        if !entry_path.is_file() {
            continue;
        }
        let Ok(path) = Utf8PathBuf::from_path_buf(entry_path) else {
            continue;
        };
        if !resolver.eligible(path.as_std_path()) {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        if stem == AGGREGATE_STEM {
            if include_aggregate {
                aggregates.push(SourceFile { path, key: None });
            }
        } else {
            let key = stem.to_owned();
            named.push(SourceFile {
                path,
                key: Some(key),
            });
        }
    }

    aggregates.sort_by(|a, b| a.path.cmp(&b.path));
    named.sort_by(|a, b| a.path.cmp(&b.path));
    aggregates.append(&mut named);
    Ok(aggregates)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use rstest::rstest;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    use super::{SourceFile, discover, is_directory};
    use crate::fragment::FormatResolver;

    fn keys(sources: &[SourceFile]) -> Vec<Option<&str>> {
        sources.iter().map(|s| s.key.as_deref()).collect()
    }

    #[rstest]
    fn missing_directory_reports_false_and_discovers_nothing() -> Result<()> {
        let dir = tempdir()?;
        let absent = dir.path().join("absent");
        assert!(!is_directory(&absent));
        let sources = discover(&absent, &FormatResolver, true).map_err(anyhow::Error::new)?;
        assert!(sources.is_empty());
        Ok(())
    }

    #[rstest]
    fn file_path_is_not_a_directory() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("index.toml");
        fs::write(&file, "")?;
        assert!(!is_directory(&file));
        assert!(is_directory(dir.path()));
        Ok(())
    }

    #[rstest]
    fn aggregate_loads_first_and_named_files_sort_by_name() -> Result<()> {
        let dir = tempdir()?;
        for name in ["zeta.toml", "index.toml", "alpha.toml", "notes.md"] {
            fs::write(dir.path().join(name), "")?;
        }
        fs::create_dir(dir.path().join("nested"))?;

        let sources = discover(dir.path(), &FormatResolver, true).map_err(anyhow::Error::new)?;
        assert_eq!(keys(&sources), [None, Some("alpha"), Some("zeta")]);
        Ok(())
    }

    #[rstest]
    fn aggregate_is_excluded_on_request() -> Result<()> {
        let dir = tempdir()?;
        for name in ["index.toml", "alpha.toml"] {
            fs::write(dir.path().join(name), "")?;
        }
        let sources = discover(dir.path(), &FormatResolver, false).map_err(anyhow::Error::new)?;
        assert_eq!(keys(&sources), [Some("alpha")]);
        Ok(())
    }

    #[rstest]
    fn repeated_scans_are_deterministic() -> Result<()> {
        let dir = tempdir()?;
        for name in ["b.toml", "a.json", "index.toml", "c.toml"] {
            fs::write(dir.path().join(name), "")?;
        }
        let first = discover(dir.path(), &FormatResolver, true).map_err(anyhow::Error::new)?;
        let second = discover(dir.path(), &FormatResolver, true).map_err(anyhow::Error::new)?;
        assert_eq!(first, second);
        assert_eq!(keys(&first), [None, Some("a"), Some("b"), Some("c")]);
        Ok(())
    }

    #[rstest]
    fn discovered_paths_are_absolute() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("alpha.toml"), "")?;
        let sources = discover(dir.path(), &FormatResolver, true).map_err(anyhow::Error::new)?;
        assert!(sources.iter().all(|s| Path::new(s.path.as_str()).is_absolute()));
        Ok(())
    }
}
