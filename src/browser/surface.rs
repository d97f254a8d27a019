use std::future::Future;

use crate::app::AppConfig;
use crate::core::{CaptureError, RawImage, ScrollPosition, ScrollTarget};

/// 一个已经打开、可以滚动并扫描图片的页面
///
/// 真实实现是 [`BrowserSession`](super::BrowserSession)，测试里换成内存中的假页面。
pub trait ScrollSurface: Send {
    /// 选出要滚动的对象
    fn resolve_target(&mut self) -> impl Future<Output = Result<ScrollTarget, CaptureError>> + Send;

    /// 滚动一步，返回滚动后的位置
    fn scroll_step(
        &mut self,
        target: ScrollTarget,
    ) -> impl Future<Output = Result<ScrollPosition, CaptureError>> + Send;

    fn scan_images(
        &mut self,
        target: ScrollTarget,
    ) -> impl Future<Output = Result<Vec<RawImage>, CaptureError>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

/// 启动浏览器并打开目标地址
pub trait PageLauncher: Sync {
    type Surface: ScrollSurface;

    fn open(
        &self,
        url: &str,
        headless: bool,
        config: &AppConfig,
    ) -> impl Future<Output = Result<Self::Surface, CaptureError>> + Send;
}
