// ============================================================================
// Compox - 构建执行引擎桥接
// ============================================================================
//
// 文件: src/core/worker.rs
// 职责: 订阅构建的任务队列，执行任务并向协调器报告状态
// 边界:
//   - ✅ 并发数量控制（每个构建独立）
//   - ✅ 任务超时管理
//   - ✅ 取消与关闭处理
//   - ✅ 执行结果聚合
//   - ❌ 不包含任务的具体执行方式（由 TaskRunner 决定）
//   - ❌ 不包含 UI 显示逻辑
//
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::coordinator::{BuildTaskQueue, TaskGraphCoordinator};
use crate::error::CompositeResult;
use crate::models::config::Config;
use crate::models::{BuildIdentifier, TaskFailure, TaskOutput};
use crate::tf;
use crate::utils::logger::Logger;

/// 任务执行方式
///
/// 构建执行引擎的接入点：给定构建和任务名，完成任务的实际工作。
pub trait TaskRunner: Send + Sync + 'static {
    fn run(
        &self,
        build: &BuildIdentifier,
        task: &str,
    ) -> impl Future<Output = Result<TaskOutput, TaskFailure>> + Send;
}

/// 执行引擎配置
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// 单个构建内的最大并发任务数
    pub max_concurrency: usize,
    /// 任务超时时长（None 表示不限制）
    pub timeout: Option<Duration>,
    /// 是否输出任务进度
    pub verbose: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: num_cpus::get(),
            timeout: None,
            verbose: false,
        }
    }
}

impl WorkerConfig {
    /// 从全局配置创建
    pub fn from_config() -> Self {
        let config = Config::current();
        Self {
            max_concurrency: config.execution.max_concurrency,
            timeout: match config.execution.task_timeout {
                0 => None,
                seconds => Some(Duration::from_secs(u64::from(seconds))),
            },
            verbose: config.output.verbose,
        }
    }
}

/// 单个任务的执行报告
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub build: BuildIdentifier,
    pub task: String,
    pub duration: Duration,
    pub result: Result<TaskOutput, TaskFailure>,
}

impl TaskReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// 构建执行引擎的运行报告
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub build: BuildIdentifier,
    /// 按完成顺序排列
    pub tasks: Vec<TaskReport>,
    /// 是否因取消而退出
    pub cancelled: bool,
}

/// 构建执行引擎
pub struct BuildWorker<R> {
    coordinator: Arc<TaskGraphCoordinator>,
    runner: Arc<R>,
    config: WorkerConfig,
}

impl<R: TaskRunner> BuildWorker<R> {
    pub fn new(coordinator: Arc<TaskGraphCoordinator>, runner: Arc<R>, config: WorkerConfig) -> Self {
        Self {
            coordinator,
            runner,
            config,
        }
    }

    /// 订阅构建的任务队列并在后台执行
    ///
    /// 协调器关闭或取消后，后台任务返回运行报告。
    pub fn spawn(self, build: &BuildIdentifier) -> CompositeResult<JoinHandle<WorkerReport>> {
        let queue = self.coordinator.attach_build(build)?;
        Ok(tokio::spawn(self.run(queue)))
    }

    /// 执行队列中的任务，直到队列关闭或构建被取消
    pub async fn run(self, mut queue: BuildTaskQueue) -> WorkerReport {
        let build = queue.build().clone();
        let cancellation = self.coordinator.cancellation_token();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut running: JoinSet<TaskReport> = JoinSet::new();
        let mut tasks = Vec::new();

        let cancelled = loop {
            // 顺便回收已完成的任务
            while let Some(joined) = running.try_join_next() {
                collect(&build, joined, &mut tasks);
            }

            let next = tokio::select! {
                biased;
                _ = cancellation.cancelled() => break true,
                next = queue.next() => next,
            };
            let Some(task) = next else {
                break false;
            };

            let permit = tokio::select! {
                biased;
                _ = cancellation.cancelled() => break true,
                permit = Arc::clone(&semaphore).acquire_owned() => permit,
            };
            let Ok(permit) = permit else {
                break true;
            };

            if self.coordinator.task_state(&build, &task).is_terminal() {
                debug!(build = %build, task, "task already finished, skipped");
                continue;
            }

            let coordinator = Arc::clone(&self.coordinator);
            let runner = Arc::clone(&self.runner);
            let config = self.config.clone();
            let task_build = build.clone();
            running.spawn(async move {
                let report = execute(&coordinator, runner.as_ref(), &config, task_build, task).await;
                drop(permit);
                report
            });
        };

        if cancelled {
            debug!(build = %build, "build cancelled, stopping executor");
            running.abort_all();
        }
        while let Some(joined) = running.join_next().await {
            collect(&build, joined, &mut tasks);
        }

        WorkerReport {
            build,
            tasks,
            cancelled,
        }
    }
}

fn collect(
    build: &BuildIdentifier,
    joined: Result<TaskReport, tokio::task::JoinError>,
    tasks: &mut Vec<TaskReport>,
) {
    match joined {
        Ok(report) => tasks.push(report),
        Err(err) if err.is_cancelled() => {}
        Err(err) => Logger::error(tf!("worker.task_join_error", build, err)),
    }
}

/// 执行单个任务并报告状态
async fn execute<R: TaskRunner>(
    coordinator: &TaskGraphCoordinator,
    runner: &R,
    config: &WorkerConfig,
    build: BuildIdentifier,
    task: String,
) -> TaskReport {
    coordinator.mark_running(&build, &task);
    if config.verbose {
        Logger::info(tf!("worker.task_start", &build, &task));
    }

    let start_time = Instant::now();
    let result = match config.timeout {
        Some(limit) => match timeout(limit, runner.run(&build, &task)).await {
            Ok(result) => result,
            Err(_) => Err(TaskFailure::new(tf!("worker.task_timeout", limit.as_secs()))),
        },
        None => runner.run(&build, &task).await,
    };
    let duration = start_time.elapsed();

    match &result {
        Ok(_) => {
            coordinator.mark_completed(&build, &task);
            if config.verbose {
                Logger::success(tf!(
                    "worker.task_success",
                    &build,
                    &task,
                    format!("{:.2}", duration.as_secs_f64())
                ));
            }
        }
        Err(failure) => {
            warn!(build = %build, task = %task, "task failed: {}", failure);
            coordinator.mark_failed(&build, &task, failure.clone());
            if config.verbose {
                Logger::error(tf!(
                    "worker.task_failed",
                    &build,
                    &task,
                    format!("{:.2}", duration.as_secs_f64()),
                    failure
                ));
            }
        }
    }

    TaskReport {
        build,
        task,
        duration,
        result,
    }
}
