use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};

use scroll_capture::app::{AppConfig, logger, prompt};
use scroll_capture::browser::ScrollSurface;
use scroll_capture::utils::text::normalize_url;
use scroll_capture::{AutoScrollResult, ChromeLauncher, Pipeline, RunResult};

/// 自动滚动网页并下载 page0、page1… 图片，合成 PDF
#[derive(Debug, Parser)]
#[command(name = "scroll_capture", version)]
struct Cli {
    /// 目标网址，省略时进入交互模式
    url: Option<String>,

    /// 下载图片并生成 PDF；不加时只滚动
    #[arg(long)]
    download_images: bool,

    /// 无界面运行浏览器，覆盖配置文件
    #[arg(long, conflicts_with = "headed")]
    headless: bool,

    /// 显示浏览器窗口，覆盖配置文件
    #[arg(long)]
    headed: bool,

    /// 每次滚动后的等待秒数
    #[arg(long, value_name = "N")]
    scroll_delay: Option<f64>,

    /// 完成后保持浏览器打开，按回车再关闭
    #[arg(long)]
    keep_open: bool,

    /// 下载并发数
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// 配置文件路径，默认 ./config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// 只覆盖命令行上给出的选项，其余沿用配置文件
    fn apply_overrides(&self, config: &mut AppConfig) {
        if self.headless {
            config.headless = true;
        } else if self.headed {
            config.headless = false;
        }
        if let Some(delay) = self.scroll_delay {
            config.set_scroll_delay_secs(delay);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency.max(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let (url, download_images) = match cli.url {
        Some(url) => (url, cli.download_images),
        None => {
            println!("自动滚动浏览器（可下载图片）");
            println!("{}", "=".repeat(50));
            let url = prompt::ask_url(&mut input, &mut output)?;
            let download = cli.download_images || prompt::ask_download(&mut input, &mut output)?;
            (url, download)
        }
    };
    let url = normalize_url(&url);

    info!("目标地址: {}", url);
    info!("下载图片: {}", if download_images { "是" } else { "否" });
    info!("{}", "-".repeat(50));

    let pipeline = Pipeline::new(ChromeLauncher, config);
    let success = if download_images {
        let captured = pipeline.capture(&url, cli.keep_open).await;
        print_run_result(&captured.result);
        close_when_ready(captured.browser, &mut input, &mut output).await?;
        captured.result.success()
    } else {
        let captured = pipeline.auto_scroll(&url, false, cli.keep_open).await;
        print_scroll_result(&captured.result);
        close_when_ready(captured.browser, &mut input, &mut output).await?;
        captured.result.success
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

async fn close_when_ready<S, R, W>(browser: Option<S>, input: &mut R, output: &mut W) -> Result<()>
where
    S: ScrollSurface,
    R: BufRead,
    W: Write,
{
    if let Some(browser) = browser {
        prompt::wait_for_enter(input, output, "已完成，按回车关闭浏览器...")?;
        browser.close().await;
    }
    Ok(())
}

fn print_run_result(result: &RunResult) {
    match result {
        RunResult::Success {
            images_dir,
            pdf_path,
            downloaded_count,
            page_count,
            ..
        } => {
            info!("✅ 下载了 {} 张图片", downloaded_count);
            info!("✅ 图片目录: {}", images_dir.display());
            info!("✅ PDF ({} 页): {}", page_count, pdf_path.display());
        }
        RunResult::Failure { error, .. } => {
            error!("❌ 失败: {}", error);
        }
    }
}

fn print_scroll_result(result: &AutoScrollResult) {
    if let Some(error) = &result.error {
        error!("❌ 失败: {}", error);
        return;
    }
    info!("✅ 滚动完成: {} 轮，发现 {} 张图片", result.ticks, result.discovered);
    if let Some(dir) = &result.images_dir {
        info!("✅ 下载了 {} 张图片到 {}", result.downloaded_count, dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(toml: &str) -> (tempfile::TempDir, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml).unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        (dir, config)
    }

    #[test]
    fn test_config_headless_kept_without_flags() {
        let (_dir, mut config) = load("headless = true\nconcurrency = 7\n");
        Cli::parse_from(["scroll_capture", "example.com"]).apply_overrides(&mut config);
        assert!(config.headless);
        assert_eq!(config.concurrency, 7);

        let (_dir, mut config) = load("headless = false\n");
        Cli::parse_from(["scroll_capture"]).apply_overrides(&mut config);
        assert!(!config.headless);
    }

    #[test]
    fn test_flags_override_config() {
        let (_dir, mut config) = load("headless = false\nscroll_delay_ms = 2000\n");
        Cli::parse_from(["scroll_capture", "--headless", "--scroll-delay", "0.5", "--concurrency", "0"])
            .apply_overrides(&mut config);
        assert!(config.headless);
        assert_eq!(config.scroll_delay_ms, 500);
        assert_eq!(config.concurrency, 1);

        let (_dir, mut config) = load("headless = true\n");
        Cli::parse_from(["scroll_capture", "--headed"]).apply_overrides(&mut config);
        assert!(!config.headless);
    }

    #[test]
    fn test_headless_and_headed_conflict() {
        assert!(Cli::try_parse_from(["scroll_capture", "--headless", "--headed"]).is_err());
    }
}
