//! 自动滚动网页，收集 `page0`、`page1`… 编号图片，并发下载后按页码合成一个 PDF。
//!
//! 流程：会话命名 → 滚动直到稳定 → 并发下载 → 按页码排序生成 PDF。
//! 入口是 [`scroll_and_download_from_url`] 与 [`auto_scroll_page`]，
//! 需要自定义配置或替换浏览器时使用 [`Pipeline`]。

pub mod app;
pub mod browser;
pub mod core;
pub mod services;
pub mod utils;

pub use app::AppConfig;
pub use browser::{BrowserSession, ChromeLauncher, PageLauncher, ScrollSurface};
pub use crate::core::{AutoScrollResult, CaptureError, DiscoveredResource, DownloadResult, RunResult, ScrollOutcome};
pub use services::{Captured, Pipeline, Session, auto_scroll_page, scroll_and_download_from_url};
