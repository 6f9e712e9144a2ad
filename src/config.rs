use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 API 地址（不含末尾斜杠）
    pub api_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 连续无操作多少秒记一次违规
    pub inactivity_threshold_secs: u32,
    /// 违规累计达到多少次强制交卷
    pub max_violations: usize,
    /// 后端未给出时长时使用的默认时长（分钟）
    pub default_duration_minutes: u32,
    /// 适应症目录 TOML 文件，未设置时使用内置目录
    pub indication_catalog_path: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 15,
            inactivity_threshold_secs: 15,
            max_violations: 3,
            default_duration_minutes: 30,
            indication_catalog_path: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读取 TOML 配置文件，再叠加环境变量
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&content)?;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("DICTANT_API_BASE_URL").unwrap_or(self.api_base_url),
            request_timeout_secs: std::env::var("DICTANT_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            inactivity_threshold_secs: std::env::var("DICTANT_INACTIVITY_THRESHOLD_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.inactivity_threshold_secs),
            max_violations: std::env::var("DICTANT_MAX_VIOLATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_violations),
            default_duration_minutes: std::env::var("DICTANT_DEFAULT_DURATION_MINUTES").ok().and_then(|v| v.parse().ok()).unwrap_or(self.default_duration_minutes),
            indication_catalog_path: std::env::var("DICTANT_INDICATION_CATALOG").ok().or(self.indication_catalog_path),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 校验监考阈值和默认时长
    pub fn validate(&self) -> AppResult<()> {
        if self.inactivity_threshold_secs == 0 {
            return Err(invalid("inactivity_threshold_secs", "必须大于 0"));
        }
        if self.max_violations == 0 {
            return Err(invalid("max_violations", "必须大于 0"));
        }
        if self.default_duration_minutes == 0 {
            return Err(invalid("default_duration_minutes", "必须大于 0"));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url", "不能为空"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn invalid(field: &'static str, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    })
}
