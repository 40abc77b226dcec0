use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{BuilderConfig, EngineConfig};
use crate::engine::EngineSettings;
use crate::parallel::calculate_optimal_workers;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const PROJECT_CONFIG: &str = "lintpass";

/// Fully merged configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintpassConfig {
    pub builder: BuilderConfig,
    pub engine: EngineConfig,
}

impl LintpassConfig {
    pub fn load(project_root: &Path) -> Result<Self> {
        Self::load_with_custom_config(project_root, None)
    }

    pub fn load_with_custom_config(project_root: &Path, custom_config: Option<&Path>) -> Result<Self> {
        Self::figment(project_root, custom_config)
            .extract()
            .context("Failed to load lintpass configuration")
    }

    /// Layered configuration sources, lowest priority first
    pub fn figment(project_root: &Path, custom_config: Option<&Path>) -> Figment {
        Self::figment_with_user_config(Self::user_config_path(), project_root, custom_config)
    }

    fn figment_with_user_config(
        user_config: Option<PathBuf>,
        project_root: &Path,
        custom_config: Option<&Path>,
    ) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(LintpassConfig::default()))
            .merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

        // User config holds the global preferences, e.g. a shared custom library
        if let Some(user_config) = user_config {
            figment = figment
                .merge(Toml::file(&user_config))
                .merge(Json::file(user_config.with_extension("json")));
        }

        // Project config
        figment = figment
            .merge(Toml::file(project_root.join(format!("{PROJECT_CONFIG}.toml"))))
            .merge(Json::file(project_root.join(format!("{PROJECT_CONFIG}.json"))));

        if let Some(custom_path) = custom_config {
            figment = match custom_path.extension().and_then(|e| e.to_str()) {
                Some("json") => figment.merge(Json::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        }

        // Environment variables always have highest priority
        figment.merge(Env::prefixed("LINTPASS_").split("__"))
    }

    /// Engine inputs for one build pass rooted at `project_root`
    pub fn engine_settings(&self, project_root: &Path) -> EngineSettings {
        let custom_lib = self.engine.custom_lib.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                project_root.join(path)
            }
        });

        let options = self
            .engine
            .options
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect();

        EngineSettings {
            custom_lib,
            options,
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.builder.drain_timeout_secs)
    }

    /// Worker threads for a build pass, from the core count and thread limits
    pub fn worker_count(&self) -> usize {
        calculate_optimal_workers(self.builder.max_threads, self.builder.thread_percentage)
    }

    fn user_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config/lintpass/config.toml"))
    }
}
