use tracing_subscriber::{EnvFilter, fmt};

/// 初始化日志，`RUST_LOG` 未设置时默认 info
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
