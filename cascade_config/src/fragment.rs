//! Loading of individual configuration source files.

use std::io;
use std::path::Path;

use figment::{
    Figment,
    providers::{Format, Json, Toml},
};
use serde_json::Value;

use crate::error::{CascadeError, file_error};

/// File extensions recognised as configuration sources.
pub const SOURCE_EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Resolves a discovered file into a configuration fragment.
///
/// The two failure modes are kept distinct: `Ok(None)` means the file does
/// not exist (the cascade skips it), while `Err` reports a load failure that
/// aborts resolution. Custom implementations can compute fragments instead of
/// reading them; see [`FnResolver`].
pub trait FragmentResolver {
    /// Reports whether `path` names a file this resolver can load.
    ///
    /// The default accepts the extensions in [`SOURCE_EXTENSIONS`],
    /// case-insensitively.
    #[must_use]
    fn eligible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SOURCE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }

    /// Loads the fragment at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`CascadeError`] when the file exists but cannot be read or
    /// parsed. A missing file is `Ok(None)`, not an error.
    fn load(&self, path: &Path) -> Result<Option<Value>, CascadeError>;
}

/// Default resolver parsing TOML and JSON sources by file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatResolver;

impl FormatResolver {
    /// Parse source data according to the file extension.
    ///
    /// TOML is validated natively first so parse failures are reported with
    /// file context before Figment performs its own parse pass.
    fn parse(path: &Path, data: &str) -> Result<Figment, CascadeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let figment = match ext.as_deref() {
            Some("json") => {
                serde_json::from_str::<Value>(data).map_err(|e| file_error(path, e))?;
                Figment::from(Json::string(data))
            }
            _ => {
                toml::from_str::<toml::Value>(data).map_err(|e| file_error(path, e))?;
                Figment::from(Toml::string(data))
            }
        };
        Ok(figment)
    }
}

impl FragmentResolver for FormatResolver {
    fn load(&self, path: &Path) -> Result<Option<Value>, CascadeError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(file_error(path, err)),
        };
        let figment = Self::parse(path, &data)?;
        let value = figment
            .extract::<Value>()
            .map_err(|e| CascadeError::Gathering(Box::new(e)))?;
        Ok(Some(value))
    }
}

/// Adapter turning a closure into a [`FragmentResolver`].
///
/// This is the seam for fragments that depend on runtime context rather than
/// file contents, such as paths derived from the working directory.
///
/// # Examples
///
/// ```rust
/// use cascade_config::{FnResolver, FragmentResolver};
/// use serde_json::json;
/// use std::path::Path;
///
/// let resolver = FnResolver::new(|path: &Path| {
///     Ok(Some(json!({"source": path.display().to_string()})))
/// });
/// let fragment = resolver.load(Path::new("index.toml"))?;
/// assert_eq!(fragment, Some(json!({"source": "index.toml"})));
/// # Ok::<_, cascade_config::CascadeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FnResolver<F>(F);

impl<F> FnResolver<F>
where
    F: Fn(&Path) -> Result<Option<Value>, CascadeError>,
{
    /// Wraps `produce` as a resolver.
    #[must_use]
    pub const fn new(produce: F) -> Self {
        Self(produce)
    }
}

impl<F> FragmentResolver for FnResolver<F>
where
    F: Fn(&Path) -> Result<Option<Value>, CascadeError>,
{
    fn load(&self, path: &Path) -> Result<Option<Value>, CascadeError> {
        (self.0)(path)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, ensure};
    use rstest::rstest;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    use super::{FormatResolver, FragmentResolver};
    use crate::error::CascadeError;

    #[rstest]
    #[case("index.toml", true)]
    #[case("logging.JSON", true)]
    #[case("notes.md", false)]
    #[case("no-extension", false)]
    fn eligibility_follows_source_extensions(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(FormatResolver.eligible(Path::new(name)), expected);
    }

    #[rstest]
    fn loads_toml_into_configuration_data() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("index.toml");
        fs::write(&path, "name = \"app\"\n\n[logging]\nenabled = true\n")?;
        let fragment = FormatResolver.load(&path).map_err(anyhow::Error::new)?;
        ensure!(
            fragment == Some(json!({"name": "app", "logging": {"enabled": true}})),
            "unexpected fragment: {fragment:?}"
        );
        Ok(())
    }

    #[rstest]
    fn loads_json_into_configuration_data() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("server.json");
        fs::write(&path, r#"{"port": 8080}"#)?;
        let fragment = FormatResolver.load(&path).map_err(anyhow::Error::new)?;
        ensure!(
            fragment == Some(json!({"port": 8080})),
            "unexpected fragment: {fragment:?}"
        );
        Ok(())
    }

    #[rstest]
    fn missing_file_is_not_an_error() -> Result<()> {
        let dir = tempdir()?;
        let fragment = FormatResolver
            .load(&dir.path().join("absent.toml"))
            .map_err(anyhow::Error::new)?;
        ensure!(fragment.is_none(), "expected Ok(None) for a missing file");
        Ok(())
    }

    #[rstest]
    #[case("broken.toml", "key = {")]
    #[case("broken.json", "{\"key\": ")]
    fn malformed_source_is_fatal(#[case] name: &str, #[case] contents: &str) -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(name);
        fs::write(&path, contents)?;
        let err = FormatResolver
            .load(&path)
            .expect_err("expected a parse failure");
        ensure!(
            matches!(&err, CascadeError::File { path: p, .. } if p == &path),
            "expected CascadeError::File naming the source, got {err:?}"
        );
        Ok(())
    }
}
