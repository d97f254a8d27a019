use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode, header};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::app::AppConfig;
use crate::core::{CaptureError, DiscoveredResource, DownloadResult, DownloadStats};
use crate::utils::text::{extension_from_content_type, extension_from_url};

const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub concurrency: usize,
    /// 每张图片最多尝试的次数，含第一次
    pub attempts: u32,
    pub backoff: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl From<&AppConfig> for DownloadSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            attempts: config.download_retries.max(1),
            backoff: config.retry_backoff(),
            request_timeout: config.request_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// 单次请求的失败类型
#[derive(Debug)]
enum FetchFailure {
    /// 网络错误、5xx、429 等，值得重试
    Transient(String),
    /// 4xx、无效地址等，不再重试
    Terminal(String),
}

struct Fetched {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

/// 并发下载已发现的图片，单张失败不影响其它图片
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    settings: DownloadSettings,
}

impl Downloader {
    pub fn new(settings: DownloadSettings) -> Result<Self, CaptureError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| CaptureError::HttpClient(e.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CaptureError> {
        Self::new(DownloadSettings::from(config))
    }

    /// 下载全部图片到 `images_dir/page{index}.{ext}`，结果按页码升序
    ///
    /// 只有目录创建失败会返回错误；单张图片的失败记录在对应的 [`DownloadResult`] 中。
    pub async fn download_all(
        &self,
        resources: &[DiscoveredResource],
        images_dir: &Path,
    ) -> Result<Vec<DownloadResult>, CaptureError> {
        tokio::fs::create_dir_all(images_dir).await?;
        info!("⚡ 开始并发下载 {} 张图片 (并发 {})", resources.len(), self.settings.concurrency);

        let mut stats = DownloadStats::default();
        let mut results: Vec<DownloadResult> = stream::iter(resources.iter().map(|resource| self.download_one(resource, images_dir)))
            .buffer_unordered(self.settings.concurrency)
            .inspect(|result| stats.add_result(result))
            .collect()
            .await;
        results.sort_by_key(|r| r.index);

        info!("下载完成: 成功 {}，失败 {}", stats.downloaded, stats.failed);
        Ok(results)
    }

    async fn download_one(&self, resource: &DiscoveredResource, images_dir: &Path) -> DownloadResult {
        let index = resource.index;
        if resource.url.trim().is_empty() {
            warn!("❌ page{} 地址为空，跳过", index);
            return DownloadResult::failed(index, "图片地址为空");
        }

        let fetched = match self.fetch_with_retry(index, &resource.url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("❌ {}", e);
                return DownloadResult::failed(index, e.to_string());
            }
        };

        let path = images_dir.join(format!("page{}.{}", index, file_extension(&resource.url, fetched.content_type.as_deref())));
        match tokio::fs::write(&path, &fetched.bytes).await {
            Ok(()) => {
                info!("已下载: {}", path.display());
                DownloadResult::saved(index, path)
            }
            Err(e) => {
                error!("写入 {} 失败: {}", path.display(), e);
                DownloadResult::failed(index, format!("写入文件失败: {}", e))
            }
        }
    }

    async fn fetch_with_retry(&self, index: u32, url: &str) -> Result<Fetched, CaptureError> {
        let attempts = self.settings.attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 1..=attempts {
            match self.fetch_once(url).await {
                Ok(fetched) => return Ok(fetched),
                Err(FetchFailure::Terminal(reason)) => {
                    return Err(CaptureError::Download { index, reason });
                }
                Err(FetchFailure::Transient(reason)) => {
                    warn!("⚠️ page{} 第 {}/{} 次下载失败: {}", index, attempt, attempts, reason);
                    last_reason = reason;
                    if attempt < attempts {
                        let delay = self.settings.backoff * attempt;
                        debug!("⏳ {:?} 后重试 page{}", delay, index);
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(CaptureError::Download {
            index,
            reason: format!("已重试 {} 次，最后一次错误: {}", attempts, last_reason),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Fetched, FetchFailure> {
        if url.starts_with("data:") {
            return decode_data_url(url).map_err(FetchFailure::Terminal);
        }

        let response = self.client.get(url).send().await.map_err(classify_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let reason = format!("HTTP {}", status);
            return Err(if is_transient_status(status) {
                FetchFailure::Transient(reason)
            } else {
                FetchFailure::Terminal(reason)
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(classify_reqwest_error)?;

        Ok(Fetched {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT
}

fn classify_reqwest_error(e: reqwest::Error) -> FetchFailure {
    if e.is_builder() || e.is_redirect() {
        FetchFailure::Terminal(e.to_string())
    } else {
        FetchFailure::Transient(e.to_string())
    }
}

/// 解析 `data:image/png;base64,...`
fn decode_data_url(url: &str) -> Result<Fetched, String> {
    let rest = url.strip_prefix("data:").ok_or_else(|| "不是 data URL".to_string())?;
    let (meta, payload) = rest.split_once(',').ok_or_else(|| "data URL 缺少逗号".to_string())?;
    let media_type = meta.strip_suffix(";base64").ok_or_else(|| "只支持 base64 编码的 data URL".to_string())?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("base64 解码失败: {}", e))?;
    Ok(Fetched {
        bytes,
        content_type: Some(media_type.to_string()),
    })
}

/// 先看地址后缀，再看 Content-Type，都没有时用 jpg
fn file_extension(url: &str, content_type: Option<&str>) -> String {
    if !url.starts_with("data:") {
        if let Some(ext) = extension_from_url(url) {
            return ext;
        }
    }
    content_type
        .and_then(extension_from_content_type)
        .unwrap_or(DEFAULT_EXTENSION)
        .to_string()
}

/// 下载结果中成功保存的文件
pub fn saved_paths(results: &[DownloadResult]) -> Vec<(u32, PathBuf)> {
    results
        .iter()
        .filter_map(|r| r.local_path.clone().map(|p| (r.index, p)))
        .collect()
}
