use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::app::AppConfig;
use crate::browser::ScrollSurface;
use crate::core::{ScrollOutcome, ScrollPosition, ScrollTarget};
use crate::services::locator::{ResourceMap, locate};

/// 小于半个像素的变化视为没有移动
const POSITION_EPSILON: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSettings {
    pub delay: Duration,
    /// 连续多少轮无变化判定为稳定
    pub stable_ticks: u32,
    pub max_ticks: u32,
    pub max_duration: Duration,
    pub viewport_only: bool,
}

impl From<&AppConfig> for ScrollSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            delay: config.scroll_delay(),
            stable_ticks: config.stable_ticks.max(1),
            max_ticks: config.max_ticks,
            max_duration: config.max_scroll_duration(),
            viewport_only: config.viewport_only,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollReport {
    pub outcome: ScrollOutcome,
    pub ticks: u32,
    pub target: ScrollTarget,
    pub resources: ResourceMap,
}

#[derive(Debug)]
enum ScrollState {
    Init,
    Scrolling { calm_ticks: u32 },
    Stable(ScrollOutcome),
}

/// 反复滚动并扫描，直到连续 `stable_ticks` 轮既没有新图片也没有滚动进展，或者预算耗尽
pub struct ScrollController<'a, S> {
    surface: &'a mut S,
    settings: ScrollSettings,
    resources: ResourceMap,
    target: ScrollTarget,
    ticks: u32,
    last_position: Option<ScrollPosition>,
}

impl<'a, S: ScrollSurface> ScrollController<'a, S> {
    pub fn new(surface: &'a mut S, settings: ScrollSettings) -> Self {
        Self {
            surface,
            settings,
            resources: ResourceMap::new(),
            target: ScrollTarget::MainPage,
            ticks: 0,
            last_position: None,
        }
    }

    pub async fn run(mut self) -> ScrollReport {
        let started = Instant::now();
        let mut state = ScrollState::Init;

        let outcome = loop {
            state = match state {
                ScrollState::Init => self.init().await,
                ScrollState::Scrolling { calm_ticks } => {
                    if self.ticks >= self.settings.max_ticks || started.elapsed() >= self.settings.max_duration {
                        warn!("滚动预算耗尽 (第 {} 轮)，使用已发现的 {} 张图片继续", self.ticks, self.resources.len());
                        ScrollState::Stable(ScrollOutcome::TimedOut)
                    } else {
                        self.tick(calm_ticks).await
                    }
                }
                ScrollState::Stable(outcome) => break outcome,
            };
        };

        if outcome.is_stable() {
            info!("已滚动到底部，共 {} 轮，发现 {} 张图片", self.ticks, self.resources.len());
        }

        ScrollReport {
            outcome,
            ticks: self.ticks,
            target: self.target,
            resources: self.resources,
        }
    }

    async fn init(&mut self) -> ScrollState {
        self.target = match self.surface.resolve_target().await {
            Ok(target) => target,
            Err(e) => {
                warn!("选择滚动对象失败: {}，改为滚动主页面", e);
                ScrollTarget::MainPage
            }
        };
        info!("开始逐屏滚动收集图片 ({:?})", self.target);

        match self.scan().await {
            Ok(_) => ScrollState::Scrolling { calm_ticks: 0 },
            Err(reason) => ScrollState::Stable(ScrollOutcome::Interrupted { reason }),
        }
    }

    async fn tick(&mut self, calm_ticks: u32) -> ScrollState {
        self.ticks += 1;

        let position = match self.surface.scroll_step(self.target).await {
            Ok(position) => position,
            Err(e) => {
                warn!("第 {} 轮滚动失败: {}，提前结束", self.ticks, e);
                return ScrollState::Stable(ScrollOutcome::Interrupted { reason: e.to_string() });
            }
        };
        debug!("已滚动到: {}/{}", position.position, position.max);

        if !self.settings.delay.is_zero() {
            sleep(self.settings.delay).await;
        }

        let changed = match self.scan().await {
            Ok(changed) => changed,
            Err(reason) => return ScrollState::Stable(ScrollOutcome::Interrupted { reason }),
        };

        let advanced = match self.last_position {
            None => true,
            Some(last) => {
                (position.position - last.position).abs() > POSITION_EPSILON
                    || (position.max - last.max).abs() > POSITION_EPSILON
            }
        };
        self.last_position = Some(position);

        let calm_ticks = if changed || advanced { 0 } else { calm_ticks + 1 };
        if calm_ticks >= self.settings.stable_ticks {
            ScrollState::Stable(ScrollOutcome::Stabilized)
        } else {
            ScrollState::Scrolling { calm_ticks }
        }
    }

    /// 扫描一次并合并，返回是否有新增或更新
    async fn scan(&mut self) -> Result<bool, String> {
        let raw = self.surface.scan_images(self.target).await.map_err(|e| {
            warn!("扫描图片失败: {}", e);
            e.to_string()
        })?;
        let delta = self.resources.merge(locate(&raw, self.settings.viewport_only));
        if !delta.is_empty() {
            debug!("新增 {} 张，更新 {} 张，累计 {} 张", delta.added, delta.changed, self.resources.len());
        }
        Ok(!delta.is_empty())
    }
}
