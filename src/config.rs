use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 生产环境中所有接口路径的固定前缀（由反向代理转发到后端）
pub const PROXY_PREFIX: &str = "/api";

/// 部署方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    /// 通过反向代理访问：`{origin}/api/...`
    Production,
    /// 直接访问后端：`{origin}/...`
    #[default]
    Development,
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 部署方式
    pub deployment: Deployment,
    /// 后端（或反向代理）地址
    pub api_origin: String,
    /// 请求超时（秒），所有请求统一使用
    pub request_timeout_secs: u64,
    /// 每个步骤最多尝试次数
    pub max_retries: u32,
    /// 重试基础间隔（毫秒），第 n 次重试前等待 n 倍
    pub retry_delay_ms: u64,
    /// 设置与历史记录的存放目录
    pub storage_dir: PathBuf,
    /// 报告下载目录
    pub download_dir: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deployment: Deployment::Development,
            api_origin: "http://localhost:8000".to_string(),
            request_timeout_secs: 300,
            max_retries: 3,
            retry_delay_ms: 1000,
            storage_dir: PathBuf::from(".simulado"),
            download_dir: PathBuf::from("boletins"),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → `APP_CONFIG` 指向的 TOML 文件 → 环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("APP_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::TomlParseFailed { source, .. } => ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            }
            .into(),
            other => other.into(),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: String::new(),
            source,
        })
    }

    fn with_env_overrides(self) -> Self {
        Self {
            deployment: match std::env::var("APP_ENV").as_deref() {
                Ok("production") => Deployment::Production,
                Ok("development") => Deployment::Development,
                _ => self.deployment,
            },
            api_origin: std::env::var("API_URL").unwrap_or(self.api_origin),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_retries),
            retry_delay_ms: std::env::var("RETRY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.retry_delay_ms),
            storage_dir: std::env::var("STORAGE_DIR").map(PathBuf::from).unwrap_or(self.storage_dir),
            download_dir: std::env::var("DOWNLOAD_DIR").map(PathBuf::from).unwrap_or(self.download_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 接口基础地址
    pub fn api_base_url(&self) -> String {
        let origin = self.api_origin.trim_end_matches('/');
        match self.deployment {
            Deployment::Production => format!("{}{}", origin, PROXY_PREFIX),
            Deployment::Development => origin.to_string(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
