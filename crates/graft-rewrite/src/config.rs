//! Run configuration and configuration-supplied recipe options.

use graft_tree::Symbol;
use graft_tree::node::validate_name;
use serde::Deserialize;

use crate::errors::{RewriteError, RewriteResult};
use crate::fixpoint::DEFAULT_MAX_ITERATIONS;
use crate::fragment::{CompoundKey, Fragment};

/// Options for one rewrite run.
///
/// ```
/// let config = graft_rewrite::RunConfig::from_json(r#"{ "workers": 2 }"#).unwrap();
/// assert_eq!(config.workers, 2);
/// assert_eq!(config.max_iterations, graft_rewrite::DEFAULT_MAX_ITERATIONS);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Worker threads for the scan and transform phases.
    pub workers: usize,
    /// Cap on fixed-point applications for recipes that repeat.
    pub max_iterations: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
                .max(1),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl RunConfig {
    pub fn from_json(text: &str) -> RewriteResult<Self> {
        let config: RunConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn validate(&self) -> RewriteResult<()> {
        if self.workers == 0 {
            return Err(RewriteError::invalid_config("`workers` must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(RewriteError::invalid_config(
                "`max_iterations` must be at least 1",
            ));
        }
        Ok(())
    }
}

/// One named field of a fragment, as written in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    pub value: String,
}

/// A fragment as written in configuration.
///
/// ```
/// let spec: graft_rewrite::FragmentSpec = serde_json::from_str(r#"{
///     "key": [
///         { "name": "groupId", "value": "org.projectlombok" },
///         { "name": "artifactId", "value": "lombok" }
///     ],
///     "values": [{ "name": "version", "value": "1.18.24" }]
/// }"#).unwrap();
/// let fragment = spec.build().unwrap();
/// assert_eq!(fragment.key().get("artifactId"), Some("lombok"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FragmentSpec {
    pub key: Vec<FieldSpec>,
    pub values: Vec<FieldSpec>,
    pub exclusions: Vec<String>,
}

impl FragmentSpec {
    /// Convert into an engine fragment, validating field names.
    pub fn build(&self) -> RewriteResult<Fragment> {
        if self.key.is_empty() {
            return Err(RewriteError::invalid_config("fragment key has no fields"));
        }
        let mut key = CompoundKey::new();
        for field in &self.key {
            key = key.with(field_name(&field.name)?, field.value.clone());
        }
        let mut fragment = Fragment::new(key);
        for field in &self.values {
            fragment = fragment.with_value(field_name(&field.name)?, field.value.clone());
        }
        Ok(fragment.with_exclusions(self.exclusions.iter().cloned()))
    }
}

fn field_name(name: &str) -> RewriteResult<Symbol> {
    validate_name(name).map_err(RewriteError::invalid_config)?;
    Ok(Symbol::from_dynamic(name))
}
