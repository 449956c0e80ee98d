// Config module - 运行配置
// 默认值 -> YAML 配置文件 -> 环境变量

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::render::DEFAULT_RADIUS;
use crate::submit::{Level, DEFAULT_MAX_UPLOAD_BYTES};

/// 配置文件路径的环境变量
pub const CONFIG_ENV: &str = "PIPEAUDIT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pipeaudit.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind: String,
    pub scanner_url: String,
    pub default_level: Level,
    pub max_upload_bytes: usize,
    pub timeout_secs: u64,
    pub legacy_upload: bool,
    pub snippet_radius: usize,
    pub static_dir: PathBuf,
    /// 会话空闲多久后回收
    pub session_ttl_secs: u64,
    pub max_sessions: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            scanner_url: "http://127.0.0.1:5000".to_string(),
            default_level: Level::L1,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            timeout_secs: 30,
            legacy_upload: false,
            snippet_radius: DEFAULT_RADIUS,
            static_dir: PathBuf::from("./static"),
            session_ttl_secs: 60 * 60,
            max_sessions: 1024,
        }
    }
}

impl Settings {
    /// 读取配置文件（PIPEAUDIT_CONFIG 或 pipeaudit.yaml），再应用环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let path = explicit.or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        });

        let mut settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// 用环境变量覆盖，`lookup` 便于测试注入
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PIPEAUDIT_BIND") {
            self.bind = v;
        }
        if let Some(v) = lookup("PIPEAUDIT_SCANNER_URL") {
            self.scanner_url = v;
        }
        if let Some(v) = lookup("PIPEAUDIT_DEFAULT_LEVEL") {
            self.default_level = v.parse().map_err(|_| ConfigError::Invalid {
                key: "PIPEAUDIT_DEFAULT_LEVEL",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("PIPEAUDIT_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_number("PIPEAUDIT_MAX_UPLOAD_BYTES", &v)?;
        }
        if let Some(v) = lookup("PIPEAUDIT_TIMEOUT_SECS") {
            self.timeout_secs = parse_number("PIPEAUDIT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("PIPEAUDIT_SNIPPET_RADIUS") {
            self.snippet_radius = parse_number("PIPEAUDIT_SNIPPET_RADIUS", &v)?;
        }
        if let Some(v) = lookup("PIPEAUDIT_LEGACY_UPLOAD") {
            self.legacy_upload = match v.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PIPEAUDIT_LEGACY_UPLOAD",
                        value: v,
                    })
                }
            };
        }
        if let Some(v) = lookup("PIPEAUDIT_SESSION_TTL_SECS") {
            self.session_ttl_secs = parse_number("PIPEAUDIT_SESSION_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("PIPEAUDIT_MAX_SESSIONS") {
            self.max_sessions = parse_number("PIPEAUDIT_MAX_SESSIONS", &v)?;
        }
        if let Some(v) = lookup("PIPEAUDIT_STATIC_DIR") {
            self.static_dir = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
