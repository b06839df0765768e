// ============================================================================
// Compox - CLI 模块
// ============================================================================
//
// 文件: src/cli/mod.rs
// 职责: CLI 命令行接口模块入口和路由
// 边界:
//   - ✅ CLI 结构定义和命令枚举
//   - ✅ 命令行参数解析配置
//   - ✅ 命令路由分发
//   - ❌ 不应包含具体命令实现逻辑
//   - ❌ 不应包含调度逻辑
//
// ============================================================================

pub mod analyze;
pub mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::models::config::{Config, RuntimeArgs};
use analyze::{handle_analyze, AnalyzeArgs};
use run::{run, RunArgs};

/// Compox - Composite build task coordinator
#[derive(Debug, Parser)]
#[command(name = "compox")]
#[command(about = "Coordinates task execution across the builds of a composite build")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Global verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Interface language (zh_cn, en_us)
    #[arg(short, long, global = true)]
    pub language: Option<String>,

    /// Maximum concurrent tasks per build
    #[arg(short = 'j', long, global = true)]
    pub max_concurrency: Option<usize>,

    /// Task timeout (seconds)
    #[arg(long, global = true)]
    pub timeout: Option<u32>,

    /// Cancel the whole build on the first task failure
    #[arg(long, global = true)]
    pub fail_fast: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Commands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze cross-build dependencies of a composite plan
    Analyze(AnalyzeArgs),
    /// Resolve the root build and run the tasks it needs from other builds
    Run(RunArgs),
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Build runtime args to override config
    let runtime_args = build_runtime_args(&cli);
    // Merge runtime args to global config
    Config::merge_runtime_args(runtime_args)?;

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args),
        Commands::Run(args) => run(args).await,
    }
}

/// Build runtime args from CLI arguments
fn build_runtime_args(cli: &Cli) -> RuntimeArgs {
    RuntimeArgs {
        verbose: if cli.verbose { Some(true) } else { None },
        colored: if cli.no_color { Some(false) } else { None },
        max_concurrency: cli.max_concurrency,
        task_timeout: cli.timeout,
        fail_fast: if cli.fail_fast { Some(true) } else { None },
        language: cli.language.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_become_runtime_args() {
        let cli = Cli::try_parse_from([
            "compox", "run", "-p", "plan.toml", "-j", "2", "--fail-fast", "--no-color",
        ])
        .unwrap();
        let args = build_runtime_args(&cli);
        assert_eq!(args.max_concurrency, Some(2));
        assert_eq!(args.fail_fast, Some(true));
        assert_eq!(args.colored, Some(false));
        assert_eq!(args.verbose, None);
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn analyze_defaults_to_table_format() {
        let cli = Cli::try_parse_from(["compox", "analyze"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => assert_eq!(args.format, "table"),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
