//! Package manifests and validation options.
//!
//! A package is a directory of model files plus a `_package.yml` manifest naming the namespace its definitions
//! live in. A manifest may import other packages by relative directory path; imports are followed recursively.
//!
//! ```yaml
//! namespace: Imaging
//! imports:
//!   - ../geometry
//! ```
//!
//! ## Notes
//! - A namespace may be reached through several import paths, but every path must lead to the same directory.
//! - Import chains are limited to [`MAX_IMPORT_DEPTH`] levels.
//! - Only local directories can be imported.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use yarrow_core::lang::conventions;

use crate::frontend::ast::Model;
use crate::frontend::loader::{self, LoadError, PACKAGE_FILE_NAME};

/// How many levels of imports are followed before giving up.
pub const MAX_IMPORT_DEPTH: usize = 10;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("package directory '{}' not found", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("a '{PACKAGE_FILE_NAME}' file is missing from the directory '{}'", .0.display())]
    MissingManifest(PathBuf),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A manifest that parsed but is not acceptable.
    #[error("{}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

impl ConfigError {
    fn invalid(path: &Path, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Manifests
// ============================================================================

/// Contents of a `_package.yml` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageConfig {
    #[serde(default)]
    pub namespace: String,
    /// Directories of imported packages, relative to this package's directory.
    #[serde(default)]
    pub imports: Vec<String>,
}

impl PackageConfig {
    /// Parse a manifest.
    ///
    /// ## Errors
    /// Malformed YAML, a missing namespace, or a namespace that is not PascalCased.
    pub fn from_yaml(path: &Path, source: &str) -> Result<Self, ConfigError> {
        let config: PackageConfig = if source.trim().is_empty() {
            PackageConfig::default()
        } else {
            serde_yaml::from_str(source).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::invalid(path, "the 'namespace' field is missing"));
        }
        if !conventions::is_namespace_name(&self.namespace) {
            return Err(ConfigError::invalid(
                path,
                format!(
                    "the 'namespace' field must be PascalCased and match the format {}",
                    conventions::NAMESPACE_NAME_FORMAT
                ),
            ));
        }
        Ok(())
    }
}

/// A package whose manifest has been read.
#[derive(Debug, Clone)]
pub struct Package {
    pub config: PackageConfig,
    /// Absolute package directory.
    pub dir: PathBuf,
    /// Namespaces of the packages this one imports directly.
    pub imports: Vec<String>,
}

impl Package {
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(PACKAGE_FILE_NAME)
    }
}

/// A root package and everything it imports, in dependency order (imports before importers, root last).
#[derive(Debug, Clone)]
pub struct PackageSet {
    packages: Vec<Package>,
}

impl PackageSet {
    pub fn root(&self) -> Option<&Package> {
        self.packages.last()
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn get(&self, namespace: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.namespace() == namespace)
    }

    /// Load the model files of every package into one model, each under its own namespace.
    ///
    /// ## Errors
    /// I/O failures stop immediately; model diagnostics from all packages are collected and returned together.
    #[tracing::instrument(skip_all, fields(packages = self.packages.len()))]
    pub fn load_model(&self) -> Result<Model, LoadError> {
        let mut model = Model::new();
        let mut errors = Vec::new();
        for package in &self.packages {
            match loader::load_dir(&mut model, &package.dir, package.namespace()) {
                Ok(()) => {}
                Err(LoadError::Diagnostics(diagnostics)) => errors.extend(diagnostics),
                Err(err) => return Err(err),
            }
            model.namespace_mut(package.namespace()).imports = package.imports.clone();
        }

        if errors.is_empty() {
            Ok(model)
        } else {
            Err(LoadError::Diagnostics(errors))
        }
    }
}

/// Read the package in `dir` and, recursively, the packages it imports.
///
/// ## Errors
/// - The directory or its manifest is missing, or a manifest is invalid.
/// - `import cycle detected` when a package imports itself through a chain.
/// - `namespace 'X' conflicts with '...'` when two directories claim the same namespace.
/// - `reached maximum number of recursive imports` past [`MAX_IMPORT_DEPTH`] levels.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_package(dir: &Path) -> Result<PackageSet, ConfigError> {
    let mut collector = PackageCollector::default();
    collector.collect(dir, MAX_IMPORT_DEPTH)?;
    for package in &collector.packages {
        tracing::debug!(namespace = package.namespace(), dir = %package.dir.display(), imports = ?package.imports, "package");
    }
    Ok(PackageSet {
        packages: collector.packages,
    })
}

#[derive(Default)]
struct PackageCollector {
    packages: Vec<Package>,
    by_namespace: HashMap<String, usize>,
    /// Namespaces on the current import chain.
    chain: HashSet<String>,
}

impl PackageCollector {
    fn collect(&mut self, dir: &Path, depth_remaining: usize) -> Result<usize, ConfigError> {
        let (dir, config) = read_manifest(dir)?;
        let manifest = dir.join(PACKAGE_FILE_NAME);

        if self.chain.contains(&config.namespace) {
            return Err(ConfigError::invalid(&manifest, "import cycle detected"));
        }
        if let Some(&index) = self.by_namespace.get(&config.namespace) {
            let existing = &self.packages[index];
            if existing.dir != dir {
                return Err(ConfigError::invalid(
                    &manifest,
                    format!(
                        "namespace '{}' conflicts with '{}'",
                        config.namespace,
                        existing.manifest_path().display()
                    ),
                ));
            }
            return Ok(index);
        }
        if depth_remaining == 0 {
            return Err(ConfigError::invalid(&manifest, "reached maximum number of recursive imports"));
        }

        self.chain.insert(config.namespace.clone());
        let mut imports = Vec::with_capacity(config.imports.len());
        for import in &config.imports {
            if import.contains("://") {
                return Err(ConfigError::invalid(
                    &manifest,
                    format!("only local package imports are supported, found '{import}'"),
                ));
            }
            let index = self.collect(&dir.join(import), depth_remaining - 1)?;
            imports.push(self.packages[index].namespace().to_string());
        }
        self.chain.remove(&config.namespace);

        let index = self.packages.len();
        self.by_namespace.insert(config.namespace.clone(), index);
        self.packages.push(Package { config, dir, imports });
        Ok(index)
    }
}

fn read_manifest(dir: &Path) -> Result<(PathBuf, PackageConfig), ConfigError> {
    let dir = fs::canonicalize(dir).map_err(|_| ConfigError::DirectoryNotFound(dir.to_path_buf()))?;
    let manifest = dir.join(PACKAGE_FILE_NAME);
    if !manifest.is_file() {
        return Err(ConfigError::MissingManifest(dir));
    }
    let source = fs::read_to_string(&manifest).map_err(|source| ConfigError::Io {
        path: manifest.clone(),
        source,
    })?;
    let config = PackageConfig::from_yaml(&manifest, &source)?;
    Ok((dir, config))
}

// ============================================================================
// Validation options
// ============================================================================

/// Knobs for a validation run.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Compute a schema string for every protocol once validation succeeds.
    pub protocol_schemas: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { protocol_schemas: true }
    }
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn protocol schema computation on or off
    pub fn with_protocol_schemas(mut self, enabled: bool) -> Self {
        self.protocol_schemas = enabled;
        self
    }
}
