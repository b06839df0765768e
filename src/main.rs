// ============================================================================
// Compox - 程序入口
// ============================================================================
//
// 文件: src/main.rs
// 职责: 初始化日志与配置并启动 CLI
//
// ============================================================================

use compox::cli::run_cli;
use compox::models::config::Config;
use compox::utils::logger::Logger;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = Config::initialize() {
        Logger::error(format!("{:#}", err));
        std::process::exit(1);
    }

    if let Err(err) = run_cli().await {
        Logger::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
