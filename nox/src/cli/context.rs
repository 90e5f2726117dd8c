//! CLI context - shared state for all commands

use crate::config::{find_default_config, ConfigError, Settings};
use crate::models::ModelResolver;
use std::path::PathBuf;
use std::sync::Arc;

pub struct CliContext {
    /// Config file in use, if any was found
    pub config_path: Option<PathBuf>,
    /// Effective settings (file + environment)
    pub settings: Settings,
    pub output_format: super::OutputFormat,
    /// Quiet mode (suppress status messages)
    pub quiet: bool,
    /// Verbose mode (extra debug output)
    pub verbose: bool,
    /// Model resolver (lazy initialized)
    resolver: Option<Arc<ModelResolver>>,
}

impl CliContext {
    /// Load configuration from an explicit path
    pub fn new(config_path: PathBuf) -> Result<Self, ConfigError> {
        let settings = Settings::load(Some(&config_path))?;
        Ok(Self::from_settings(settings, Some(config_path)))
    }

    /// Use the first default config path that exists, or built-in defaults
    pub fn with_defaults() -> Result<Self, ConfigError> {
        let config_path = find_default_config();
        let settings = Settings::load(config_path.as_deref())?;
        Ok(Self::from_settings(settings, config_path))
    }

    pub fn from_settings(settings: Settings, config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            settings,
            output_format: super::OutputFormat::Table,
            quiet: false,
            verbose: false,
            resolver: None,
        }
    }

    /// Get or initialize the model resolver
    pub fn resolver(&mut self) -> Arc<ModelResolver> {
        if let Some(ref resolver) = self.resolver {
            return Arc::clone(resolver);
        }
        let resolver = Arc::new(ModelResolver::from_settings(&self.settings));
        self.resolver = Some(Arc::clone(&resolver));
        resolver
    }

    /// Print verbose message (only in verbose mode)
    pub fn debug(&self, message: &str) {
        if self.verbose {
            eprintln!("[DEBUG] {}", message);
        }
    }
}
