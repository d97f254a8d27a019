use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_stable_ticks")]
    pub stable_ticks: u32,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
    #[serde(default = "default_max_scroll_secs")]
    pub max_scroll_secs: u64,
    #[serde(default = "default_download_retries")]
    pub download_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
    #[serde(default = "default_script_timeout_secs")]
    pub script_timeout_secs: u64,
    #[serde(default = "default_viewport_only")]
    pub viewport_only: bool,
    #[serde(default = "default_images_root")]
    pub images_root: PathBuf,
    #[serde(default = "default_pdf_root")]
    pub pdf_root: PathBuf,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = config_path.unwrap_or_else(|| Path::new("config.toml"));
        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
            let cfg: AppConfig = toml::from_str(&raw)
                .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
            return Ok(cfg);
        }
        Ok(AppConfig::default())
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    /// 秒数形式的滚动间隔，负数和 NaN 按 0 处理
    pub fn set_scroll_delay_secs(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        self.scroll_delay_ms = (secs * 1000.0).round() as u64;
    }

    pub fn max_scroll_duration(&self) -> Duration {
        Duration::from_secs(self.max_scroll_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_secs(self.script_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scroll_delay_ms: default_scroll_delay_ms(),
            headless: default_headless(),
            concurrency: default_concurrency(),
            stable_ticks: default_stable_ticks(),
            max_ticks: default_max_ticks(),
            max_scroll_secs: default_max_scroll_secs(),
            download_retries: default_download_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            settle_ms: default_settle_ms(),
            load_timeout_secs: default_load_timeout_secs(),
            script_timeout_secs: default_script_timeout_secs(),
            viewport_only: default_viewport_only(),
            images_root: default_images_root(),
            pdf_root: default_pdf_root(),
            user_agent: default_user_agent(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

fn default_scroll_delay_ms() -> u64 {
    2000
}

fn default_headless() -> bool {
    true
}

fn default_concurrency() -> usize {
    5
}

fn default_stable_ticks() -> u32 {
    2
}

fn default_max_ticks() -> u32 {
    500
}

fn default_max_scroll_secs() -> u64 {
    600
}

fn default_download_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_load_timeout_secs() -> u64 {
    10
}

fn default_script_timeout_secs() -> u64 {
    16
}

fn default_viewport_only() -> bool {
    true
}

fn default_images_root() -> PathBuf {
    PathBuf::from("downloaded_images")
}

fn default_pdf_root() -> PathBuf {
    PathBuf::from("downloaded")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}
