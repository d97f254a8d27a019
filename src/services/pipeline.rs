use tracing::{error, info, warn};

use crate::app::AppConfig;
use crate::browser::{BrowserSession, ChromeLauncher, PageLauncher, ScrollSurface};
use crate::core::{AutoScrollResult, CaptureError, DownloadResult, RunResult};
use crate::services::download::Downloader;
use crate::services::pdf::assemble_pdf;
use crate::services::scroll::{ScrollController, ScrollReport, ScrollSettings};
use crate::services::session::Session;

/// 一次运行的结果，以及（`keep_browser_open` 时）交给调用方的浏览器
///
/// `browser` 为 `Some` 时由调用方负责 [`ScrollSurface::close`]。
pub struct Captured<S, R = RunResult> {
    pub result: R,
    pub browser: Option<S>,
}

/// 会话命名 → 滚动 → 下载 → PDF 的完整流程
pub struct Pipeline<L> {
    launcher: L,
    config: AppConfig,
}

impl<L: PageLauncher> Pipeline<L> {
    pub fn new(launcher: L, config: AppConfig) -> Self {
        Self { launcher, config }
    }

    /// 打开页面、滚动收集图片、下载并生成 PDF；任何失败都体现在 [`RunResult`] 中
    pub async fn capture(&self, url: &str, keep_browser_open: bool) -> Captured<L::Surface> {
        let session = Session::create(&self.config.images_root, &self.config.pdf_root);
        info!("会话: {}", session.id);

        let mut surface = match self.open(url).await {
            Ok(surface) => surface,
            Err(e) => {
                error!("❌ {}", e);
                return Captured {
                    result: RunResult::failure(e),
                    browser: None,
                };
            }
        };

        info!("图片将保存到: {}", session.images_dir.display());
        info!("PDF 将保存到: {}", session.pdf_path.display());

        let result = self.capture_on(&mut surface, &session).await;
        let browser = self.release(surface, keep_browser_open).await;
        Captured { result, browser }
    }

    /// 在已经打开的页面上执行滚动、下载和 PDF 合成
    pub async fn capture_on<S: ScrollSurface>(&self, surface: &mut S, session: &Session) -> RunResult {
        let report = self.scroll(surface).await;
        if report.resources.is_empty() {
            warn!("没有找到任何图片");
            return RunResult::failure(CaptureError::NoResources);
        }

        let results = match self.download(&report, session).await {
            Ok(results) => results,
            Err(e) => {
                error!("❌ 下载阶段失败: {}", e);
                return RunResult::Failure {
                    images_dir: Some(session.images_dir.clone()),
                    pdf_path: None,
                    downloaded_count: 0,
                    error: e.to_string(),
                };
            }
        };

        let downloaded_count = results.iter().filter(|r| r.is_saved()).count();
        if downloaded_count == 0 {
            error!("❌ 所有图片都下载失败");
            return RunResult::Failure {
                images_dir: Some(session.images_dir.clone()),
                pdf_path: None,
                downloaded_count: 0,
                error: "所有图片都下载失败".to_string(),
            };
        }

        info!("下载完成，正在生成 PDF...");
        let pdf_path = session.pdf_path.clone();
        let assembled = tokio::task::spawn_blocking(move || assemble_pdf(&results, &pdf_path))
            .await
            .unwrap_or_else(|e| Err(CaptureError::Pdf {
                path: session.pdf_path.clone(),
                reason: e.to_string(),
            }));

        match assembled {
            Ok(pdf) => {
                info!("✅ 已生成 PDF: {}", pdf.path.display());
                RunResult::Success {
                    session_id: session.id.clone(),
                    images_dir: session.images_dir.clone(),
                    pdf_path: pdf.path,
                    downloaded_count,
                    page_count: pdf.pages.len(),
                    scroll: report.outcome,
                }
            }
            Err(e) => {
                error!("❌ 生成 PDF 失败: {}", e);
                RunResult::Failure {
                    images_dir: Some(session.images_dir.clone()),
                    pdf_path: None,
                    downloaded_count,
                    error: e.to_string(),
                }
            }
        }
    }

    /// 只滚动，可选下载图片，不生成 PDF
    pub async fn auto_scroll(
        &self,
        url: &str,
        download_images: bool,
        keep_browser_open: bool,
    ) -> Captured<L::Surface, AutoScrollResult> {
        let mut surface = match self.open(url).await {
            Ok(surface) => surface,
            Err(e) => {
                error!("❌ {}", e);
                return Captured {
                    result: AutoScrollResult::failure(e),
                    browser: None,
                };
            }
        };

        let report = self.scroll(&mut surface).await;
        let mut result = AutoScrollResult {
            success: true,
            outcome: Some(report.outcome.clone()),
            ticks: report.ticks,
            discovered: report.resources.len(),
            images_dir: None,
            downloaded_count: 0,
            error: None,
        };

        if download_images {
            if report.resources.is_empty() {
                result.success = false;
                result.error = Some(CaptureError::NoResources.to_string());
            } else {
                let session = Session::create(&self.config.images_root, &self.config.pdf_root);
                result.images_dir = Some(session.images_dir.clone());
                match self.download(&report, &session).await {
                    Ok(results) => {
                        result.downloaded_count = results.iter().filter(|r| r.is_saved()).count();
                        if result.downloaded_count == 0 {
                            result.success = false;
                            result.error = Some("所有图片都下载失败".to_string());
                        }
                    }
                    Err(e) => {
                        result.success = false;
                        result.error = Some(e.to_string());
                    }
                }
            }
        }

        info!("自动滚动完成 ({} 轮，发现 {} 张图片)", result.ticks, result.discovered);
        let browser = self.release(surface, keep_browser_open).await;
        Captured { result, browser }
    }

    async fn open(&self, url: &str) -> Result<L::Surface, CaptureError> {
        if url.trim().is_empty() {
            return Err(CaptureError::Navigation {
                url: url.to_string(),
                reason: "地址为空".to_string(),
            });
        }
        self.launcher.open(url, self.config.headless, &self.config).await
    }

    async fn scroll<S: ScrollSurface>(&self, surface: &mut S) -> ScrollReport {
        ScrollController::new(surface, ScrollSettings::from(&self.config)).run().await
    }

    async fn download(&self, report: &ScrollReport, session: &Session) -> Result<Vec<DownloadResult>, CaptureError> {
        let downloader = Downloader::from_config(&self.config)?;
        info!("发现 {} 张不重复的图片，开始下载", report.resources.len());
        downloader.download_all(&report.resources.resources(), &session.images_dir).await
    }

    async fn release<S: ScrollSurface>(&self, surface: S, keep_browser_open: bool) -> Option<S> {
        if keep_browser_open {
            info!("浏览器保持打开，使用完毕后请自行关闭");
            Some(surface)
        } else {
            surface.close().await;
            None
        }
    }
}

/// 滚动页面、下载所有 pageN 图片并合成 PDF
///
/// `scroll_delay` 以秒计。使用默认配置（输出到 `downloaded_images/` 与 `downloaded/`）。
/// 不会返回错误，失败时 `result` 为 [`RunResult::Failure`]。
pub async fn scroll_and_download_from_url(
    url: &str,
    scroll_delay: f64,
    headless: bool,
    keep_browser_open: bool,
) -> Captured<BrowserSession> {
    let mut config = AppConfig::default();
    config.set_scroll_delay_secs(scroll_delay);
    config.headless = headless;
    Pipeline::new(ChromeLauncher, config).capture(url, keep_browser_open).await
}

/// 只滚动页面到底部，`download_images` 时顺带下载图片（不生成 PDF）
pub async fn auto_scroll_page(url: &str, scroll_delay: f64, download_images: bool, headless: bool) -> AutoScrollResult {
    let mut config = AppConfig::default();
    config.set_scroll_delay_secs(scroll_delay);
    config.headless = headless;
    Pipeline::new(ChromeLauncher, config)
        .auto_scroll(url, download_images, false)
        .await
        .result
}
