//! Path-based discovery of specification sources.
//!
//! This module is only available when the `path-loading` feature is enabled
//! (which is the default).
//!
//! # Ordering
//!
//! Discovered files are parsed global definitions first: a path ending in
//! the configured global suffix (`global-attributes.json` by default) sorts
//! before every other path, and the rest follow in lexicographic order.
//!
//! Discovery never recurses into subdirectories. A `**` segment in a
//! pattern matches like a single `*`.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, glob_with};
use tracing::debug;

use crate::{CollisionPolicy, Error, ParseSource, SpecDefinitions};

/// Default suffix identifying the global shared definitions file.
pub const GLOBAL_DEFINITIONS_SUFFIX: &str = "global-attributes.json";

/// Configuration for loading an index from the filesystem.
///
/// # Examples
///
/// ```rust,ignore
/// use spec_definitions::{CollisionPolicy, DiscoveryConfig};
///
/// // Everything under ~/.spec-definitions/
/// let config = DiscoveryConfig::default();
///
/// // A custom directory, failing on duplicate codes or names
/// let config = DiscoveryConfig::with_directory("/usr/share/zap/json")
///     .with_policy(CollisionPolicy::Reject);
///
/// let definitions = SpecDefinitions::from_config(&config)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    directory: PathBuf,
    global_suffix: String,
    policy: CollisionPolicy,
}

impl Default for DiscoveryConfig {
    fn default() -> Self { Self::with_directory(Self::default_directory()) }
}

impl DiscoveryConfig {
    /// Creates a configuration reading every `*.json` file in `directory`.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            global_suffix: GLOBAL_DEFINITIONS_SUFFIX.to_string(),
            policy: CollisionPolicy::default(),
        }
    }

    /// Returns the default directory: `~/.spec-definitions/`
    ///
    /// Falls back to `./.spec-definitions/` if the home directory cannot be
    /// determined.
    pub fn default_directory() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".spec-definitions")
    }

    /// Sets the file-name suffix that marks the global definitions file,
    /// which is parsed before every other file.
    pub fn with_global_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.global_suffix = suffix.into();
        self
    }

    /// Sets the collision policy used when building the index.
    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the directory searched for `*.json` files.
    pub fn directory(&self) -> &Path { &self.directory }

    /// Returns the suffix identifying the global definitions file.
    pub fn global_suffix(&self) -> &str { &self.global_suffix }

    /// Returns the collision policy used when building the index.
    pub fn policy(&self) -> CollisionPolicy { self.policy }

    /// The glob pattern this configuration discovers files with.
    pub fn pattern(&self) -> String {
        self.directory.join("*.json").display().to_string()
    }
}

/// Sorts paths so that global definitions come first, then by path.
///
/// The sort is stable and keyed by `(0 if global else 1, path)`.
pub fn order_sources(paths: &mut [PathBuf], global_suffix: &str) {
    paths.sort_by_cached_key(|path| {
        let path = path.to_string_lossy().into_owned();
        (u8::from(!path.ends_with(global_suffix)), path)
    });
}

/// Finds the files matching `pattern` without recursing, in parse order.
pub fn discover_sources(
    pattern: &str,
    global_suffix: &str,
) -> crate::Result<Vec<PathBuf>> {
    let pattern = non_recursive(pattern);
    let mut paths = Vec::new();
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::default()
    };
    let entries = glob_with(&pattern, options).map_err(|error| Error::Pattern {
        pattern: pattern.clone(),
        message: error.msg.to_string(),
    })?;
    for entry in entries {
        let path = entry.map_err(|error| Error::Discovery {
            path: error.path().to_path_buf(),
            error: error.into(),
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }
    order_sources(&mut paths, global_suffix);
    debug!(%pattern, files = paths.len(), "discovered specification sources");
    Ok(paths)
}

fn non_recursive(pattern: &str) -> String {
    let mut pattern = pattern.to_string();
    while pattern.contains("**") {
        pattern = pattern.replace("**", "*");
    }
    pattern
}

/// Builds an index from every file matching `pattern`.
///
/// Files are ordered with [`order_sources`] using
/// [`GLOBAL_DEFINITIONS_SUFFIX`], wrapped as [`ParseSource`]s and handed to
/// [`SpecDefinitions::new`].
///
/// # Examples
///
/// ```rust,ignore
/// use spec_definitions::spec_definitions_from_path;
///
/// let definitions = spec_definitions_from_path("data-model/json/*.json")?;
/// println!("{:?}", definitions.get_cluster_name(6));
/// ```
pub fn spec_definitions_from_path(
    pattern: &str,
) -> crate::Result<SpecDefinitions> {
    SpecDefinitions::from_path(pattern)
}

impl SpecDefinitions {
    /// Builds an index from every file matching the glob `pattern`.
    ///
    /// This method is only available when the `path-loading` feature is
    /// enabled.
    pub fn from_path(pattern: &str) -> crate::Result<Self> {
        let paths = discover_sources(pattern, GLOBAL_DEFINITIONS_SUFFIX)?;
        Self::new(paths.into_iter().map(ParseSource::from))
    }

    /// Builds an index from the files a [`DiscoveryConfig`] selects.
    ///
    /// A missing directory yields an empty index.
    pub fn from_config(config: &DiscoveryConfig) -> crate::Result<Self> {
        let paths = discover_sources(&config.pattern(), config.global_suffix())?;
        Self::with_policy(paths.into_iter().map(ParseSource::from), config.policy())
    }
}
