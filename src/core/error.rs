use std::path::PathBuf;

use thiserror::Error;

/// 一次采集流程中可能出现的错误
///
/// 滚动超时不在这里：它是 [`ScrollOutcome::TimedOut`](super::types::ScrollOutcome)，按部分成功处理。
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("浏览器启动失败: {0}")]
    BrowserLaunch(String),

    #[error("页面加载失败 {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("页面脚本执行失败: {0}")]
    Script(String),

    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(String),

    #[error("page{index} 下载失败: {reason}")]
    Download { index: u32, reason: String },

    #[error("page{index} 图片解码失败: {reason}")]
    Decode { index: u32, reason: String },

    #[error("页面上没有找到任何 pageN 图片")]
    NoResources,

    #[error("没有可用于生成 PDF 的图片")]
    EmptyResult,

    #[error("写入 PDF 失败 {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    pub fn script(err: impl std::fmt::Display) -> Self {
        CaptureError::Script(err.to_string())
    }
}
