//! Deterministic, cascading configuration resolution.
//!
//! A [`Cascade`] folds several configuration layers into one
//! [`serde_json::Value`], later layers winning on conflicting scalar keys
//! while nested mappings accumulate recursively:
//!
//! 1. an optional in-memory base value;
//! 2. source files in the base configuration directory;
//! 3. source files in `{config_dir}/{environment}` (environment name taken
//!    from [`DEFAULT_ENV_NAME_VAR`], defaulting to [`DEFAULT_ENVIRONMENT`]);
//! 4. source files in `{config_dir}/local`;
//! 5. a database connection string read from [`DEFAULT_DATABASE_URL_VAR`].
//!
//! Within a directory the aggregate file (stem `index`) merges at the top
//! level and always loads first, so sibling files can override its settings.
//! Every other eligible file merges under a key derived from its stem:
//! `logging.toml` contributes the `logging` mapping.
//!
//! Resolution is synchronous and completes before the owning process
//! proceeds; a missing environment or `local` subdirectory contributes
//! nothing, while a missing base directory or a malformed source file is
//! fatal.
//!
//! ```rust,no_run
//! use cascade_config::Cascade;
//!
//! # fn run() -> Result<(), cascade_config::CascadeError> {
//! let config = Cascade::builder("config").build().resolve()?;
//! if let Some(host) = config.pointer("/database/host") {
//!     println!("database host: {host}");
//! }
//! # Ok(())
//! # }
//! ```

mod database;
mod discovery;
mod env;
mod error;
mod fragment;
mod merge;
mod resolve;

pub use database::{ConnectionDescriptor, parse_connection_string};
pub use discovery::{AGGREGATE_STEM, SourceFile, discover, is_directory};
pub use env::{Environment, ProcessEnv};
pub use error::CascadeError;
pub use fragment::{FnResolver, FormatResolver, FragmentResolver, SOURCE_EXTENSIONS};
pub use merge::{merge_under_key, merge_value};
pub use resolve::{
    Cascade, CascadeBuilder, DEFAULT_DATABASE_KEY, DEFAULT_DATABASE_URL_VAR, DEFAULT_ENV_NAME_VAR,
    DEFAULT_ENVIRONMENT,
};
