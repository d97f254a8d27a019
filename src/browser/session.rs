use std::time::Duration;

use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::scripts::{RESOLVE_TARGET_JS, scan_images_js, scroll_step_js};
use super::surface::ScrollSurface;
use crate::core::{CaptureError, RawImage, ScrollPosition, ScrollTarget};

/// 一次运行独占的浏览器和页面
///
/// 由流程显式传递，不做全局单例；`keep_browser_open` 时交给调用方，由调用方负责 [`close`](ScrollSurface::close)。
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    script_timeout: Duration,
}

impl BrowserSession {
    pub(crate) fn new(browser: Browser, page: Page, handler: JoinHandle<()>, script_timeout: Duration) -> Self {
        Self {
            browser,
            page,
            handler,
            script_timeout,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行页面脚本并处理超时
    async fn evaluate<T: DeserializeOwned>(&self, js_code: String, timeout_msg: &str) -> Result<T, CaptureError> {
        let eval_result = timeout(self.script_timeout, self.page.evaluate(js_code))
            .await
            .map_err(|_| CaptureError::Script(timeout_msg.to_string()))?
            .map_err(CaptureError::script)?;
        eval_result.into_value().map_err(CaptureError::script)
    }
}

impl ScrollSurface for BrowserSession {
    async fn resolve_target(&mut self) -> Result<ScrollTarget, CaptureError> {
        let target: ScrollTarget = self
            .evaluate(format!("({})()", RESOLVE_TARGET_JS), "选择滚动对象超时")
            .await?;
        debug!("滚动对象: {:?}", target);
        Ok(target)
    }

    async fn scroll_step(&mut self, target: ScrollTarget) -> Result<ScrollPosition, CaptureError> {
        self.evaluate(scroll_step_js(&target)?, "滚动超时").await
    }

    async fn scan_images(&mut self, target: ScrollTarget) -> Result<Vec<RawImage>, CaptureError> {
        self.evaluate(scan_images_js(&target)?, "扫描图片超时").await
    }

    async fn close(mut self) {
        debug!("正在关闭浏览器");
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("等待浏览器进程退出失败: {}", e);
        }
        self.handler.abort();
    }
}
