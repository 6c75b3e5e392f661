//! Configuration module for depres-rs
//!
//! This module handles the configuration feed of a resolution run:
//! - Output requests ("observables") the user wants computed
//! - Auxiliary entries that disambiguate how individual functions get their
//!   dependencies and backend requirements, and carry their options
//! - Active models and the model hierarchy
//! - Resolution settings
//!
//! # Files
//!
//! Run files and setup files are read as TOML (`.toml`) or JSON (any other
//! extension). A setup file bundles a [`RegistryFeed`] with a [`RunConfig`]
//! so the binary can resolve a complete configuration from one document.
//!
//! # Example
//!
//! ```ignore
//! use depres_rs::config::RunConfig;
//!
//! let config = RunConfig::load("scan.toml")?;
//! let hierarchy = config.hierarchy();
//! ```

use crate::error::{DepResError, Result};
use crate::models::ModelHierarchy;
use crate::resolver::node::{Functor, Requirement};
use crate::resolver::{ResolutionError, ResolutionResult};
use crate::types::{Options, RegistryFeed};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run file format version
pub const RUN_CONFIG_VERSION: u32 = 1;

/// Field comparison used by every configuration filter: an empty pattern or
/// `*` matches anything, otherwise the strings must be equal.
pub fn field_matches(pattern: &str, value: &str) -> bool {
    pattern.is_empty() || pattern == "*" || pattern == value
}

// ==================== Config Entry ====================

/// A record from the observables or auxiliaries section, or one of their
/// `dependencies` / `backends` sub-entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(default)]
    pub capability: String,

    #[serde(rename = "type", default)]
    pub result_type: String,

    /// Function name filter
    #[serde(default)]
    pub function: String,

    /// Module (origin) name filter
    #[serde(default)]
    pub module: String,

    /// Version filter, only consulted for backend entries
    #[serde(default)]
    pub version: String,

    /// Whether the resolved output should be printed
    #[serde(default = "default_true")]
    pub printme: bool,

    /// Options handed to the function when it is activated
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,

    /// How the matched function's own requirements should be resolved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ConfigEntry>,

    /// How the matched function's backend requirements should be resolved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<ConfigEntry>,
}

/// An externally requested output quantity.
pub type OutputRequest = ConfigEntry;

fn default_true() -> bool {
    true
}

impl ConfigEntry {
    pub fn new(capability: impl Into<String>, result_type: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            result_type: result_type.into(),
            printme: true,
            ..Default::default()
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_printme(mut self, printme: bool) -> Self {
        self.printme = printme;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_dependency(mut self, entry: ConfigEntry) -> Self {
        self.dependencies.push(entry);
        self
    }

    pub fn with_backend(mut self, entry: ConfigEntry) -> Self {
        self.backends.push(entry);
        self
    }

    /// The `(capability, type)` this entry requests.
    pub fn requirement(&self) -> Requirement {
        Requirement::new(self.capability.clone(), self.result_type.clone())
    }

    /// Whether the entry is about `requirement` (capability comparison only).
    pub fn matches_requirement(&self, requirement: &Requirement) -> bool {
        field_matches(&self.capability, &requirement.capability)
    }

    /// Whether a function satisfies every field given in this entry.
    pub fn matches_functor(&self, functor: &dyn Functor) -> bool {
        field_matches(&self.capability, functor.capability())
            && field_matches(&self.result_type, functor.result_type())
            && field_matches(&self.function, functor.name())
            && field_matches(&self.module, functor.origin())
    }

    /// Like [`matches_functor`](Self::matches_functor), plus the version.
    pub fn matches_backend(&self, functor: &dyn Functor) -> bool {
        self.matches_functor(functor) && field_matches(&self.version, functor.version())
    }
}

/// The unique entry in `entries` about `requirement`, if any.
pub fn find_entry_for_requirement<'a>(
    requirement: &Requirement,
    entries: &'a [ConfigEntry],
) -> ResolutionResult<Option<&'a ConfigEntry>> {
    unique_match(entries.iter().filter(|e| e.matches_requirement(requirement)), || {
        format!("capability {}", requirement)
    })
}

/// The unique entry in `entries` describing `functor`, if any.
pub fn find_entry_for_functor<'a>(
    functor: &dyn Functor,
    entries: &'a [ConfigEntry],
) -> ResolutionResult<Option<&'a ConfigEntry>> {
    unique_match(entries.iter().filter(|e| e.matches_functor(functor)), || {
        format!("function {}", functor.label())
    })
}

fn unique_match<'a, I, F>(mut matches: I, subject: F) -> ResolutionResult<Option<&'a ConfigEntry>>
where
    I: Iterator<Item = &'a ConfigEntry>,
    F: FnOnce() -> String,
{
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        return Err(ResolutionError::DuplicateConfigEntry { subject: subject() });
    }
    Ok(first)
}

// ==================== Models ====================

/// A model declaration with its direct parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDecl {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

// ==================== Resolution Settings ====================

/// Knobs of the resolution algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSettings {
    /// Break ties in favour of functions tied to the scanned model or its
    /// nearest ancestor.
    #[serde(default = "default_true")]
    pub prefer_model_specific_functions: bool,

    /// Fail instead of falling back when the model ancestry is exhausted
    /// without finding any model-specific candidate.
    #[serde(default)]
    pub strict_model_ancestry: bool,

    /// Where to write the Graphviz description of the resolved graph.
    #[serde(default)]
    pub graph_output: Option<PathBuf>,

    /// Where to write the JSON description of the resolved graph.
    #[serde(default)]
    pub snapshot_output: Option<PathBuf>,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            prefer_model_specific_functions: true,
            strict_model_ancestry: false,
            graph_output: None,
            snapshot_output: None,
        }
    }
}

// ==================== Run Config ====================

/// Configuration feed for one resolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Format version for future migration support
    #[serde(default = "default_run_config_version")]
    pub version: u32,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub resolution: ResolutionSettings,

    /// Models being scanned
    #[serde(default)]
    pub active_models: Vec<String>,

    /// Model hierarchy declarations
    #[serde(default)]
    pub models: Vec<ModelDecl>,

    /// Output requests
    #[serde(default)]
    pub observables: Vec<OutputRequest>,

    /// Per-function disambiguation and options
    #[serde(default)]
    pub auxiliaries: Vec<ConfigEntry>,
}

fn default_run_config_version() -> u32 {
    RUN_CONFIG_VERSION
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            version: RUN_CONFIG_VERSION,
            name: "Untitled Run".to_string(),
            resolution: ResolutionSettings::default(),
            active_models: Vec::new(),
            models: Vec::new(),
            observables: Vec::new(),
            auxiliaries: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_active_model(mut self, model: impl Into<String>) -> Self {
        self.active_models.push(model.into());
        self
    }

    pub fn with_model<I, S>(mut self, name: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models.push(ModelDecl {
            name: name.into(),
            parents: parents.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_observable(mut self, request: OutputRequest) -> Self {
        self.observables.push(request);
        self
    }

    pub fn with_auxiliary(mut self, entry: ConfigEntry) -> Self {
        self.auxiliaries.push(entry);
        self
    }

    /// Build the model hierarchy from the declarations. Active models that
    /// are not declared become parentless roots.
    pub fn hierarchy(&self) -> ModelHierarchy {
        let mut hierarchy = ModelHierarchy::new();
        for decl in &self.models {
            hierarchy.declare(decl.name.clone(), decl.parents.iter().cloned());
        }
        for model in &self.active_models {
            if !hierarchy.contains(model) {
                hierarchy.declare(model.clone(), Vec::<String>::new());
            }
        }
        hierarchy
    }

    /// Load a run file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_document(path.as_ref())
    }

    /// Save a run file to disk, as TOML or JSON by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_document(self, path.as_ref())
    }
}

// ==================== Setup File ====================

/// Registry feed and run configuration in one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupFile {
    #[serde(default)]
    pub registry: RegistryFeed,
    #[serde(default)]
    pub config: RunConfig,
}

impl SetupFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_document(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_document(self, path.as_ref())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DepResError::Config(format!("Failed to read {:?}: {}", path, e)))?;

    if is_toml(path) {
        toml::from_str(&content)
            .map_err(|e| DepResError::Config(format!("Failed to parse {:?}: {}", path, e)))
    } else {
        serde_json::from_str(&content)
            .map_err(|e| DepResError::Config(format!("Failed to parse {:?}: {}", path, e)))
    }
}

fn save_document<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DepResError::Config(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }
    }

    let content = if is_toml(path) {
        toml::to_string_pretty(value)
            .map_err(|e| DepResError::Serialization(format!("Failed to serialize: {}", e)))?
    } else {
        serde_json::to_string_pretty(value)?
    };

    std::fs::write(path, content)
        .map_err(|e| DepResError::Config(format!("Failed to write {:?}: {}", path, e)))
}
