use std::path::{Path, PathBuf};

use color_eyre::eyre::Result;
use config::FileFormat;
use serde::Deserialize;

use crate::{
  branches::{RepositoryConfig, pager::DEFAULT_PAGE_SIZE},
  utils::{default_rules_path, get_config_dir, get_data_dir},
};

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub data_dir: PathBuf,
  #[serde(default)]
  pub config_dir: PathBuf,
}

/// Which implementation answers branch queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Git2,
  Cli,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PanelConfig {
  #[serde(default = "default_page_size")]
  pub page_size: usize,
}

impl Default for PanelConfig {
  fn default() -> Self {
    PanelConfig { page_size: DEFAULT_PAGE_SIZE }
  }
}

fn default_page_size() -> usize {
  DEFAULT_PAGE_SIZE
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TriggerRulesConfig {
  #[serde(default)]
  pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
  #[serde(default, flatten)]
  pub config: AppConfig,
  #[serde(default)]
  pub backend: Backend,
  #[serde(default)]
  pub repository: RepositoryConfig,
  #[serde(default)]
  pub panel: PanelConfig,
  #[serde(default)]
  pub trigger_rules: TriggerRulesConfig,
}

impl Config {
  /// Layers the embedded defaults, the user's config directory and an optional extra file.
  pub fn new(extra: Option<&Path>) -> Result<Self, config::ConfigError> {
    Config::layered(&get_data_dir(), &get_config_dir(), extra)
  }

  fn layered(data_dir: &Path, config_dir: &Path, extra: Option<&Path>) -> Result<Self, config::ConfigError> {
    let mut builder = config::Config::builder()
      .add_source(config::File::from_str(CONFIG, FileFormat::Json5))
      .set_default("data_dir", data_dir.to_string_lossy().to_string())?
      .set_default("config_dir", config_dir.to_string_lossy().to_string())?;

    let config_files = [
      ("config.json5", FileFormat::Json5),
      ("config.json", FileFormat::Json),
      ("config.yaml", FileFormat::Yaml),
      ("config.toml", FileFormat::Toml),
      ("config.ini", FileFormat::Ini),
    ];
    let mut found_config = false;
    for (file, format) in &config_files {
      let path = config_dir.join(file);
      builder = builder.add_source(config::File::from(path.clone()).format(*format).required(false));
      if path.exists() {
        found_config = true;
      }
    }
    if !found_config {
      log::debug!("No configuration file found in {}, using defaults", config_dir.display());
    }
    if let Some(extra) = extra {
      builder = builder.add_source(config::File::from(extra).required(true));
    }

    builder.build()?.try_deserialize()
  }

  pub fn rules_path(&self) -> PathBuf {
    self.trigger_rules.path.clone().unwrap_or_else(default_rules_path)
  }
}
