// ============================================================================
// Compox - CLI Run 命令
// ============================================================================
//
// 文件: src/cli/run.rs
// 职责: 组合构建运行命令的 CLI 接口层
// 边界:
//   - ✅ 命令行参数定义和解析
//   - ✅ 组装协调器、编排器与各构建执行引擎
//   - ✅ 结果输出
//   - ❌ 不应包含调度逻辑
//   - ❌ 不应包含命令执行细节
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::core::{
    ArtifactBuildOrchestrator, BuildWorker, CommandTaskRunner, TaskGraphCoordinator, WorkerConfig,
};
use crate::models::plan::{CompositePlan, ResolutionDefinition};
use crate::ui::summary::render_execution_summary;
use crate::utils::constants::icons;
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 运行组合构建
#[derive(Debug, Args)]
pub struct RunArgs {
    /// 组合构建计划文件
    #[arg(short = 'p', long, default_value = "composite.toml")]
    pub plan: PathBuf,

    /// 只执行指定的解析（默认执行根构建的所有解析）
    #[arg(short = 'r', long)]
    pub resolution: Option<String>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let plan = Arc::new(CompositePlan::load(&args.plan)?);
    let base_dir = plan_dir(&args.plan);

    let resolutions: Vec<&ResolutionDefinition> = match &args.resolution {
        Some(name) => vec![plan
            .resolution(name)
            .ok_or_else(|| anyhow::anyhow!(tf!("run.resolution_not_found", name)))?],
        None => plan.resolutions_for(&plan.root).collect(),
    };

    if resolutions.is_empty() {
        Logger::warn(tf!("run.no_resolutions", &plan.root));
        return Ok(());
    }

    Logger::info(tf!("run.start", &plan.root, plan.builds.len()));
    let start_time = Instant::now();

    let coordinator = Arc::new(TaskGraphCoordinator::new_from_config());
    let orchestrator = ArtifactBuildOrchestrator::new(Arc::clone(&coordinator));
    let worker_config = WorkerConfig::from_config();
    let runner = Arc::new(
        CommandTaskRunner::new(Arc::clone(&plan), base_dir, orchestrator.clone())
            .with_verbose(worker_config.verbose),
    );

    // 每个构建一个执行引擎
    let mut workers = Vec::with_capacity(plan.builds.len());
    for build in &plan.builds {
        let worker = BuildWorker::new(
            Arc::clone(&coordinator),
            Arc::clone(&runner),
            worker_config.clone(),
        );
        workers.push(worker.spawn(&build.name)?);
    }

    let mut files = Vec::new();
    let mut failure = None;
    for resolution in resolutions {
        let result = resolution.to_result();
        match orchestrator.build_all(&resolution.build, &result).await {
            Ok(collection) => {
                Logger::info(tf!("run.resolution_done", &resolution.name, collection.len()));
                files.extend(collection);
            }
            Err(err) => {
                // 被其他任务的失败取消时，失败原因会在执行摘要中列出
                if err.is_cancelled() {
                    Logger::warn(tf!("run.resolution_cancelled", &resolution.name));
                } else {
                    Logger::error(tf!("run.resolution_failed", &resolution.name, &err));
                }
                failure = Some(err);
                break;
            }
        }
    }

    // 失败时不再等待其余任务
    if failure.is_some() {
        coordinator.cancel();
    }
    coordinator.close();

    let mut reports = Vec::with_capacity(workers.len());
    for handle in workers {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(err) => Logger::error(tf!("worker.join_error", err)),
        }
    }

    if !files.is_empty() {
        Logger::info("");
        Logger::info(t!("run.files"));
        for file in &files {
            Logger::info(format!("  {} {}", icons::ARTIFACT, file.display()));
        }
    }

    render_execution_summary(&reports, &coordinator.summary(), start_time.elapsed());

    match failure {
        Some(err) => Err(anyhow::Error::new(err).context(t!("run.failed"))),
        None => {
            Logger::success(t!("run.success"));
            Ok(())
        }
    }
}

/// 计划文件所在目录
fn plan_dir(plan: &Path) -> PathBuf {
    match plan.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
