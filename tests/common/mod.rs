#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::net::TcpListener;

use scroll_capture::app::AppConfig;
use scroll_capture::browser::{PageLauncher, ScrollSurface};
use scroll_capture::core::{CaptureError, RawImage, ScrollPosition, ScrollTarget};

/// 宽度不同的图片，读回 PDF 时用页面宽度确认页序
pub const PAGE0_WIDTH: u32 = 30;
pub const PAGE1_WIDTH: u32 = 60;
pub const PAGE2_WIDTH: u32 = 90;

pub fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 120, 220])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

#[derive(Default)]
pub struct ServerState {
    pub flaky_hits: AtomicUsize,
    pub missing_hits: AtomicUsize,
    pub down_hits: AtomicUsize,
    pub slow_in_flight: AtomicUsize,
    pub slow_peak: AtomicUsize,
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn page0() -> Response {
    ([(header::CONTENT_TYPE, "image/jpeg")], encode(PAGE0_WIDTH, 20, ImageFormat::Jpeg)).into_response()
}

async fn page1() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], encode(PAGE1_WIDTH, 20, ImageFormat::Png)).into_response()
}

async fn page2() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], encode(PAGE2_WIDTH, 20, ImageFormat::Png)).into_response()
}

/// 地址没有后缀，只能靠 Content-Type 判断扩展名
async fn render() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], encode(10, 10, ImageFormat::Png)).into_response()
}

async fn broken() -> Response {
    ([(header::CONTENT_TYPE, "image/jpeg")], b"<html>expired</html>".to_vec()).into_response()
}

async fn missing(State(state): State<Arc<ServerState>>) -> Response {
    state.missing_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND.into_response()
}

/// 前两次 503，第三次成功
async fn flaky(State(state): State<Arc<ServerState>>) -> Response {
    let hit = state.flaky_hits.fetch_add(1, Ordering::SeqCst);
    if hit < 2 {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ([(header::CONTENT_TYPE, "image/png")], encode(10, 10, ImageFormat::Png)).into_response()
}

async fn down(State(state): State<Arc<ServerState>>) -> Response {
    state.down_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

/// 每个请求停留 80ms，记录同时在处理的请求数峰值
async fn slow(State(state): State<Arc<ServerState>>) -> Response {
    let now = state.slow_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.slow_peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(80)).await;
    state.slow_in_flight.fetch_sub(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], encode(10, 10, ImageFormat::Png)).into_response()
}

pub async fn start_server() -> TestServer {
    let state = Arc::new(ServerState::default());
    let app = Router::new()
        .route("/img/page0.jpg", get(page0))
        .route("/img/page1.png", get(page1))
        .route("/img/page2.png", get(page2))
        .route("/img/render", get(render))
        .route("/img/broken.jpg", get(broken))
        .route("/img/missing.jpg", get(missing))
        .route("/img/flaky.png", get(flaky))
        .route("/img/down.png", get(down))
        .route("/img/slow.png", get(slow))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer { addr, state }
}

pub fn test_config(root: &Path) -> AppConfig {
    AppConfig {
        scroll_delay_ms: 0,
        retry_backoff_ms: 10,
        request_timeout_secs: 5,
        concurrency: 4,
        images_root: root.join("downloaded_images"),
        pdf_root: root.join("downloaded"),
        ..AppConfig::default()
    }
}

/// 假页面：第 n 次扫描返回 `scans[n]`（超出后保持最后一个），滚动位置在 `scans.len() - 1` 轮后停止
#[derive(Clone)]
pub struct StubPage {
    scans: Vec<Vec<(u32, String)>>,
    steps: usize,
    scan_count: usize,
    pub closed: Arc<AtomicBool>,
}

impl ScrollSurface for StubPage {
    async fn resolve_target(&mut self) -> Result<ScrollTarget, CaptureError> {
        Ok(ScrollTarget::ContentsDiv)
    }

    async fn scroll_step(&mut self, _target: ScrollTarget) -> Result<ScrollPosition, CaptureError> {
        self.steps += 1;
        let growth = self.scans.len().saturating_sub(1).max(1);
        let position = self.steps.min(growth) as f64 * 800.0;
        Ok(ScrollPosition {
            position,
            max: growth as f64 * 800.0,
        })
    }

    async fn scan_images(&mut self, _target: ScrollTarget) -> Result<Vec<RawImage>, CaptureError> {
        let i = self.scan_count.min(self.scans.len() - 1);
        self.scan_count += 1;
        Ok(self.scans[i]
            .iter()
            .map(|(index, src)| RawImage {
                id: format!("page{}", index),
                src: src.clone(),
                visible: true,
            })
            .collect())
    }

    async fn close(self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct StubLauncher {
    page: StubPage,
    fail_launch: bool,
    opened: Arc<AtomicUsize>,
}

impl StubLauncher {
    pub fn new(scans: Vec<Vec<(u32, String)>>) -> Self {
        Self {
            page: StubPage {
                scans,
                steps: 0,
                scan_count: 0,
                closed: Arc::new(AtomicBool::new(false)),
            },
            fail_launch: false,
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        let mut launcher = Self::new(vec![vec![]]);
        launcher.fail_launch = true;
        launcher
    }

    pub fn opened_counter(&self) -> Arc<AtomicUsize> {
        self.opened.clone()
    }

    /// 所有克隆出来的页面共享同一个关闭标记
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.page.closed.clone()
    }
}

impl PageLauncher for StubLauncher {
    type Surface = StubPage;

    async fn open(&self, _url: &str, _headless: bool, _config: &AppConfig) -> Result<StubPage, CaptureError> {
        if self.fail_launch {
            return Err(CaptureError::BrowserLaunch("Could not auto detect a chrome executable".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.page.clone())
    }
}
