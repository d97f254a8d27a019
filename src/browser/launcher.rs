use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::scripts::HIDE_WEBDRIVER_JS;
use super::session::BrowserSession;
use super::surface::{PageLauncher, ScrollSurface};
use crate::app::AppConfig;
use crate::core::CaptureError;

/// 本机启动 Chromium 的启动器
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

impl PageLauncher for ChromeLauncher {
    type Surface = BrowserSession;

    async fn open(&self, url: &str, headless: bool, config: &AppConfig) -> Result<BrowserSession, CaptureError> {
        let viewport = Viewport {
            width: config.window_width,
            height: config.window_height,
            ..Default::default()
        };

        let mut builder = BrowserConfig::builder()
            .viewport(viewport)
            .window_size(config.window_width, config.window_height)
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", config.user_agent));
        if !headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(CaptureError::BrowserLaunch)?;

        info!("正在启动浏览器 (headless: {})", headless);
        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CaptureError::BrowserLaunch(e.to_string()))?;

        // 在后台处理浏览器事件
        let handler_task = tokio::task::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let navigation_error = |reason: String| CaptureError::Navigation {
            url: url.to_string(),
            reason,
        };

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(CaptureError::BrowserLaunch(e.to_string()));
            }
        };
        let session = BrowserSession::new(browser, page, handler_task, config.script_timeout());

        if let Err(e) = session.page().evaluate_on_new_document(HIDE_WEBDRIVER_JS).await {
            warn!("注入脚本失败: {}，继续执行", e);
        }

        info!("正在打开: {}", url);
        let loaded = async {
            session
                .page()
                .goto(url)
                .await
                .map_err(|e| navigation_error(e.to_string()))?;
            timeout(config.load_timeout(), session.page().find_element("body"))
                .await
                .map_err(|_| navigation_error("等待 <body> 超时".to_string()))?
                .map_err(|e| navigation_error(e.to_string()))?;
            Ok::<(), CaptureError>(())
        }
        .await;

        if let Err(e) = loaded {
            session.close().await;
            return Err(e);
        }

        debug!("页面已加载，等待 {:?} 让懒加载内容就绪", config.settle_delay());
        sleep(config.settle_delay()).await;
        Ok(session)
    }
}
