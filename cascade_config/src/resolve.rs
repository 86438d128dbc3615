//! The cascade orchestrator: sequences discovery, loading and merging across
//! the configuration layers.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::database::parse_connection_string;
use crate::discovery::{discover, is_directory};
use crate::env::{Environment, ProcessEnv};
use crate::error::CascadeError;
use crate::fragment::{FormatResolver, FragmentResolver};
use crate::merge::{merge_under_key, merge_value};

/// Environment variable naming the active environment.
pub const DEFAULT_ENV_NAME_VAR: &str = "APP_ENV";
/// Environment name assumed when the variable is unset or empty.
pub const DEFAULT_ENVIRONMENT: &str = "develop";
/// Environment variable holding the database connection string.
pub const DEFAULT_DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Key the parsed connection descriptor merges under.
pub const DEFAULT_DATABASE_KEY: &str = "database";

/// Name of the always-last override subdirectory.
const LOCAL_DIR: &str = "local";

/// A configured configuration cascade.
///
/// Layers merge in a fixed order: the base value, the base directory, the
/// environment subdirectory, the `local` subdirectory, and finally the
/// connection-string override. Later layers win on conflicting scalar keys
/// while nested mappings accumulate recursively.
///
/// # Examples
///
/// ```rust,no_run
/// use cascade_config::Cascade;
///
/// # fn run() -> Result<(), cascade_config::CascadeError> {
/// let cascade = Cascade::builder("config")
///     .include_root_index(true)
///     .build();
/// let config = cascade.resolve()?;
/// # Ok(())
/// # }
/// ```
pub struct Cascade {
    config_dir: PathBuf,
    include_root_index: bool,
    env_name_var: String,
    database_url_var: String,
    database_key: String,
    resolver: Box<dyn FragmentResolver>,
    env: Box<dyn Environment>,
}

impl Cascade {
    /// Creates a builder for a cascade rooted at `config_dir`.
    #[must_use]
    pub fn builder(config_dir: impl Into<PathBuf>) -> CascadeBuilder {
        CascadeBuilder::new(config_dir)
    }

    /// Resolves the cascade starting from an empty base value.
    ///
    /// # Errors
    ///
    /// Returns a [`CascadeError`] when the configuration directory is missing,
    /// a source file fails to load, or a non-empty connection string fails to
    /// parse.
    pub fn resolve(&self) -> Result<Value, CascadeError> {
        self.resolve_with_base(Value::Object(Map::new()))
    }

    /// Resolves the cascade, folding every layer into `base`.
    ///
    /// The same accumulator flows through all layers; callers typically pass
    /// their aggregate defaults here instead of enabling the base directory's
    /// aggregate file.
    ///
    /// # Errors
    ///
    /// Returns a [`CascadeError`] when the configuration directory is missing,
    /// a source file fails to load, or a non-empty connection string fails to
    /// parse.
    pub fn resolve_with_base(&self, base: Value) -> Result<Value, CascadeError> {
        if !is_directory(&self.config_dir) {
            return Err(CascadeError::MissingConfigDir {
                path: self.config_dir.clone(),
            });
        }

        let mut merged = base;
        self.merge_directory(&mut merged, &self.config_dir, self.include_root_index)?;

        let environment = self
            .env
            .get_non_empty(&self.env_name_var)
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_owned());
        tracing::debug!(%environment, "resolving environment layer");
        // An environment literally named "local" makes the next two layers
        // scan the same directory; it merges twice. Documented behaviour.
        self.merge_directory(&mut merged, &self.config_dir.join(&environment), true)?;
        self.merge_directory(&mut merged, &self.config_dir.join(LOCAL_DIR), true)?;

        self.apply_connection_string(&mut merged)?;
        Ok(merged)
    }

    /// Discover, load and fold one directory's sources into `target`.
    ///
    /// The aggregate file (when included) merges at the top level; named
    /// files deep-merge under their stem-derived key.
    fn merge_directory(
        &self,
        target: &mut Value,
        dir: &Path,
        include_aggregate: bool,
    ) -> Result<(), CascadeError> {
        let sources = discover(dir, self.resolver.as_ref(), include_aggregate)?;
        if sources.is_empty() {
            tracing::debug!(directory = %dir.display(), "no configuration sources");
            return Ok(());
        }
        for source in sources {
            // A file listed by discovery but gone by load time is skipped,
            // like any other absent source.
            let Some(fragment) = self.resolver.load(source.path.as_std_path())? else {
                continue;
            };
            tracing::debug!(path = %source.path, key = source.key.as_deref(), "merging fragment");
            match source.key {
                Some(key) => merge_under_key(target, &key, fragment),
                None => merge_value(target, fragment),
            }
        }
        Ok(())
    }

    /// Apply the connection-string override, the last and highest-precedence
    /// layer.
    fn apply_connection_string(&self, target: &mut Value) -> Result<(), CascadeError> {
        let Some(raw) = self.env.get_non_empty(&self.database_url_var) else {
            return Ok(());
        };
        let Some(descriptor) = parse_connection_string(&raw) else {
            return Err(CascadeError::ConnectionString {
                var: self.database_url_var.clone(),
                value: raw,
            });
        };
        tracing::debug!(var = %self.database_url_var, key = %self.database_key, "applying connection-string override");
        let fragment = serde_json::to_value(descriptor)?;
        merge_under_key(target, &self.database_key, fragment);
        Ok(())
    }
}

/// Builder for [`Cascade`].
///
/// Defaults: the base directory's aggregate file is excluded, the environment
/// name comes from [`DEFAULT_ENV_NAME_VAR`], the connection string from
/// [`DEFAULT_DATABASE_URL_VAR`] and merges under [`DEFAULT_DATABASE_KEY`];
/// sources are loaded by [`FormatResolver`] and the environment is read from
/// the process via [`ProcessEnv`].
pub struct CascadeBuilder {
    config_dir: PathBuf,
    include_root_index: bool,
    env_name_var: String,
    database_url_var: String,
    database_key: String,
    resolver: Box<dyn FragmentResolver>,
    env: Box<dyn Environment>,
}

impl CascadeBuilder {
    /// Creates a builder rooted at `config_dir` with the defaults above.
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            include_root_index: false,
            env_name_var: DEFAULT_ENV_NAME_VAR.to_owned(),
            database_url_var: DEFAULT_DATABASE_URL_VAR.to_owned(),
            database_key: DEFAULT_DATABASE_KEY.to_owned(),
            resolver: Box::new(FormatResolver),
            env: Box::new(ProcessEnv),
        }
    }

    /// Whether the base directory's aggregate file participates in the merge.
    ///
    /// Off by default; callers usually pass their aggregate defaults to
    /// [`Cascade::resolve_with_base`] instead.
    #[must_use]
    pub const fn include_root_index(mut self, include: bool) -> Self {
        self.include_root_index = include;
        self
    }

    /// Overrides the environment variable naming the active environment.
    #[must_use]
    pub fn env_name_var(mut self, name: impl Into<String>) -> Self {
        self.env_name_var = name.into();
        self
    }

    /// Overrides the environment variable holding the connection string.
    #[must_use]
    pub fn database_url_var(mut self, name: impl Into<String>) -> Self {
        self.database_url_var = name.into();
        self
    }

    /// Overrides the key the parsed connection descriptor merges under.
    #[must_use]
    pub fn database_key(mut self, key: impl Into<String>) -> Self {
        self.database_key = key.into();
        self
    }

    /// Replaces the fragment resolver used to load source files.
    #[must_use]
    pub fn resolver(mut self, resolver: impl FragmentResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replaces the environment lookup.
    #[must_use]
    pub fn environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Builds the configured [`Cascade`].
    #[must_use]
    pub fn build(self) -> Cascade {
        Cascade {
            config_dir: self.config_dir,
            include_root_index: self.include_root_index,
            env_name_var: self.env_name_var,
            database_url_var: self.database_url_var,
            database_key: self.database_key,
            resolver: self.resolver,
            env: self.env,
        }
    }
}
