use anyhow::{Context, Result};
use clap::ValueEnum;
use livemark_compiler_html::RenderOptions;
use livemark_editor::{Pipeline, SchedulerConfig};
use livemark_evaluator::{ComponentRegistry, CustomComponentSpec, DuplicatePolicy, UnknownTagFallback};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_NAME: &str = "livemark.config.json";

/// Livemark configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Quiet period before a watched edit is compiled
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How tags without a registered component are shown
    #[serde(default)]
    pub unknown_tags: UnknownTagFallback,

    /// What happens when a custom component is registered twice
    #[serde(default)]
    pub duplicate_tags: DuplicatePolicy,

    /// Compiled module cache capacity (0 disables the cache)
    #[serde(default = "default_module_cache")]
    pub module_cache: usize,

    /// Components authored outside the built-in set
    #[serde(default)]
    pub custom_components: Vec<CustomComponentSpec>,

    /// HTML output options
    #[serde(default)]
    pub render: RenderOptions,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_module_cache() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            unknown_tags: UnknownTagFallback::default(),
            duplicate_tags: DuplicatePolicy::default(),
            module_cache: default_module_cache(),
            custom_components: vec![],
            render: RenderOptions::default(),
        }
    }
}

impl Config {
    /// Load config from `explicit`, or from the working directory when present
    pub fn load(cwd: &Path, explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => cwd.join(path),
            None => cwd.join(DEFAULT_CONFIG_NAME),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid config in {}", config_path.display()))?;
            debug!(path = %config_path.display(), "Loaded config");
            Ok(config)
        } else if explicit.is_some() {
            anyhow::bail!("Config file does not exist: {}", config_path.display())
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn path(cwd: &Path) -> PathBuf {
        cwd.join(DEFAULT_CONFIG_NAME)
    }

    /// Built-in components plus the configured custom ones
    pub fn registry(&self) -> Result<ComponentRegistry> {
        let registry = ComponentRegistry::with_builtins().with_policy(self.duplicate_tags);
        for spec in &self.custom_components {
            let outcome = registry
                .register_custom(spec)
                .with_context(|| format!("Cannot register custom component `{}`", spec.name))?;
            debug!(name = %spec.name, ?outcome, "Registered custom component");
        }
        if !self.custom_components.is_empty() {
            info!(count = self.custom_components.len(), "Custom components registered");
        }
        Ok(registry)
    }

    pub fn pipeline(&self) -> Result<Pipeline> {
        Ok(Pipeline::new(self.registry()?)
            .with_fallback(self.unknown_tags)
            .with_cache(self.module_cache))
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::with_debounce(Duration::from_millis(self.debounce_ms))
    }
}

/// `--unknown-tags` flag, overrides `unknownTags`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnknownTagsArg {
    Label,
    Children,
    Hidden,
}

impl From<UnknownTagsArg> for UnknownTagFallback {
    fn from(arg: UnknownTagsArg) -> Self {
        match arg {
            UnknownTagsArg::Label => UnknownTagFallback::Label,
            UnknownTagsArg::Children => UnknownTagFallback::Children,
            UnknownTagsArg::Hidden => UnknownTagFallback::Hidden,
        }
    }
}
