//! Read-only environment lookup used by the cascade.
//!
//! Resolution consults the environment for the environment name and the
//! database connection string. Passing the lookup in explicitly keeps
//! resolution deterministic and lets tests supply a map instead of mutating
//! process state.

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Key-to-value lookup over environment variables.
pub trait Environment {
    /// Returns the value of `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns the value of `key`, treating an empty value as unset.
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.is_empty())
    }
}

/// The process environment, read through [`std::env::var`].
///
/// Values that are not valid Unicode are treated as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::Environment;

    #[rstest]
    fn map_lookup_distinguishes_empty_from_unset() {
        let env: HashMap<String, String> = HashMap::from([
            ("APP_ENV".to_owned(), "staging".to_owned()),
            ("DATABASE_URL".to_owned(), String::new()),
        ]);
        assert_eq!(
            Environment::get(&env, "APP_ENV"),
            Some("staging".to_owned())
        );
        assert_eq!(env.get_non_empty("APP_ENV"), Some("staging".to_owned()));
        assert_eq!(Environment::get(&env, "DATABASE_URL"), Some(String::new()));
        assert_eq!(env.get_non_empty("DATABASE_URL"), None);
        assert_eq!(env.get_non_empty("MISSING"), None);
    }
}
