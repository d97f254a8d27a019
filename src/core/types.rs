use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 页面上发现的一张编号图片：`page{index}` 对应的地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    pub index: u32,
    pub url: String,
}

/// 页面脚本返回的原始 `<img>` 信息，尚未做编号校验
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawImage {
    pub id: String,
    pub src: String,
    #[serde(default)]
    pub visible: bool,
}

/// 实际滚动的对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollTarget {
    /// 顶层文档中的 `div#contents`
    ContentsDiv,
    /// 第 `frame` 个 iframe 内的 `div#contents`
    IframeContents { frame: usize },
    /// 第 `frame` 个 iframe 的整个文档
    Iframe { frame: usize },
    MainPage,
}

/// 一次滚动之后的位置
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScrollPosition {
    pub position: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScrollOutcome {
    /// 连续若干轮没有新图片且滚动位置不再前进
    Stabilized,
    /// 轮数或时间预算耗尽
    TimedOut,
    /// 某次滚动动作失败，提前结束
    Interrupted { reason: String },
}

impl ScrollOutcome {
    pub fn is_stable(&self) -> bool {
        matches!(self, ScrollOutcome::Stabilized)
    }
}

/// 单张图片的下载结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub index: u32,
    pub local_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl DownloadResult {
    pub fn saved(index: u32, path: PathBuf) -> Self {
        Self {
            index,
            local_path: Some(path),
            error: None,
        }
    }

    pub fn failed(index: u32, error: impl Into<String>) -> Self {
        Self {
            index,
            local_path: None,
            error: Some(error.into()),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.local_path.is_some()
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: usize,
    pub failed: usize,
}

impl DownloadStats {
    pub fn add_result(&mut self, result: &DownloadResult) {
        if result.is_saved() {
            self.downloaded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// 完整流程（滚动 → 下载 → PDF）的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunResult {
    Success {
        session_id: String,
        images_dir: PathBuf,
        pdf_path: PathBuf,
        downloaded_count: usize,
        page_count: usize,
        scroll: ScrollOutcome,
    },
    Failure {
        images_dir: Option<PathBuf>,
        pdf_path: Option<PathBuf>,
        downloaded_count: usize,
        error: String,
    },
}

impl RunResult {
    pub fn failure(error: impl ToString) -> Self {
        RunResult::Failure {
            images_dir: None,
            pdf_path: None,
            downloaded_count: 0,
            error: error.to_string(),
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, RunResult::Success { .. })
    }

    pub fn downloaded_count(&self) -> usize {
        match self {
            RunResult::Success { downloaded_count, .. } | RunResult::Failure { downloaded_count, .. } => {
                *downloaded_count
            }
        }
    }

    pub fn images_dir(&self) -> Option<&Path> {
        match self {
            RunResult::Success { images_dir, .. } => Some(images_dir),
            RunResult::Failure { images_dir, .. } => images_dir.as_deref(),
        }
    }

    pub fn pdf_path(&self) -> Option<&Path> {
        match self {
            RunResult::Success { pdf_path, .. } => Some(pdf_path),
            RunResult::Failure { pdf_path, .. } => pdf_path.as_deref(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RunResult::Success { .. } => None,
            RunResult::Failure { error, .. } => Some(error),
        }
    }
}

/// 只滚动（可选下载）时的结果，不生成 PDF
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoScrollResult {
    pub success: bool,
    pub outcome: Option<ScrollOutcome>,
    pub ticks: u32,
    pub discovered: usize,
    pub images_dir: Option<PathBuf>,
    pub downloaded_count: usize,
    pub error: Option<String>,
}

impl AutoScrollResult {
    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            outcome: None,
            ticks: 0,
            discovered: 0,
            images_dir: None,
            downloaded_count: 0,
            error: Some(error.to_string()),
        }
    }
}
