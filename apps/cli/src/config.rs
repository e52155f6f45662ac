use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chart_core::ChartKind;
use ingest::{
    ApiSettings, DEFAULT_API_URL, DEFAULT_INITIAL_TOTAL_PAGES, DEFAULT_USER_AGENT, RunOptions,
};
use serde::{Deserialize, Serialize};

use crate::dirs;

const CONFIG_FILE_NAME: &str = "config.toml";
const API_KEY_ENV: &str = "LASTFM_API_KEY";
pub const DEFAULT_DB_FILE_NAME: &str = "openapi.sqlite";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub api_key: String,
    pub api_url: String,
    pub user_agent: String,
    /// Items requested per page.
    pub limit: u32,
    pub rate_limit_ms: u64,
    pub initial_total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    pub schema: String,
    pub tables: Vec<ChartKind>,
    pub cache_namespace: String,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            limit: 500,
            rate_limit_ms: 350,
            initial_total_pages: DEFAULT_INITIAL_TOTAL_PAGES,
            database_path: None,
            schema: "main".to_string(),
            tables: ChartKind::ALL.to_vec(),
            cache_namespace: "lastfm_api".to_string(),
        }
    }
}

impl EtlConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            limit: self.limit,
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn run_options(&self, kind: ChartKind) -> RunOptions {
        let mut options = RunOptions::new(kind);
        options.schema = self.schema.clone();
        options.rate_limit = Duration::from_millis(self.rate_limit_ms);
        options.initial_total_pages = self.initial_total_pages;
        options
    }

    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(API_KEY_ENV)
            && !value.trim().is_empty()
        {
            self.api_key = value.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err(format!(
                "api_key is empty; set it in the config file or via {API_KEY_ENV}"
            ));
        }
        if self.limit == 0 {
            return Err("limit must be greater than zero".to_string());
        }
        if self.tables.is_empty() {
            return Err("tables must name at least one chart table".to_string());
        }
        chart_db::validate_identifier(&self.schema)
            .map_err(|err| format!("schema: {}", err))?;
        chart_db::validate_identifier(&self.cache_namespace)
            .map_err(|err| format!("cache_namespace: {}", err))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: EtlConfig,
    pub file: PathBuf,
    pub created: bool,
}

/// Reads `path`, or the default config file, writing defaults first when the
/// file does not exist yet.
pub fn load_or_create(path: Option<&Path>) -> Result<ConfigLoad, String> {
    let file = match path {
        Some(path) => path.to_path_buf(),
        None => dirs::config_dir()?.join(CONFIG_FILE_NAME),
    };

    if file.exists() {
        let contents = fs::read_to_string(&file)
            .map_err(|err| format!("read config {}: {}", file.display(), err))?;
        let config =
            parse_config(&contents).map_err(|err| format!("config {}: {}", file.display(), err))?;
        return Ok(ConfigLoad {
            config,
            file,
            created: false,
        });
    }

    if let Some(dir) = file.parent() {
        fs::create_dir_all(dir)
            .map_err(|err| format!("create config dir {}: {}", dir.display(), err))?;
    }
    let config = EtlConfig::default();
    let contents =
        toml::to_string_pretty(&config).map_err(|err| format!("serialize config: {}", err))?;
    fs::write(&file, contents).map_err(|err| format!("write config {}: {}", file.display(), err))?;

    Ok(ConfigLoad {
        config,
        file,
        created: true,
    })
}

pub fn parse_config(contents: &str) -> Result<EtlConfig, String> {
    toml::from_str(contents).map_err(|err| format!("parse: {}", err))
}
