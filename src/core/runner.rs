// ============================================================================
// Compox - 命令任务执行器
// ============================================================================
//
// 文件: src/core/runner.rs
// 职责: 按组合构建计划执行任务命令
// 边界:
//   - ✅ 任务命令执行和输出捕获
//   - ✅ 执行前解析任务声明的依赖（可能等待其他构建）
//   - ✅ 跨平台 shell 选择
//   - ❌ 不包含并发控制（由 BuildWorker 负责）
//   - ❌ 不包含任务状态管理
//
// ============================================================================

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

use crate::core::orchestrator::ArtifactBuildOrchestrator;
use crate::core::worker::TaskRunner;
use crate::models::plan::CompositePlan;
use crate::models::{BuildIdentifier, TaskFailure, TaskOutput};
use crate::tf;
use crate::utils::logger::Logger;

/// 按计划执行 shell 命令的任务执行器
pub struct CommandTaskRunner {
    plan: Arc<CompositePlan>,
    /// 计划文件所在目录，构建目录相对于它
    base_dir: PathBuf,
    orchestrator: ArtifactBuildOrchestrator,
    verbose: bool,
}

impl CommandTaskRunner {
    pub fn new(
        plan: Arc<CompositePlan>,
        base_dir: PathBuf,
        orchestrator: ArtifactBuildOrchestrator,
    ) -> Self {
        Self {
            plan,
            base_dir,
            orchestrator,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 以 build 的身份解析依赖，等待其他构建产出的制品
    async fn resolve(&self, build: &BuildIdentifier, resolution: &str) -> Result<(), TaskFailure> {
        let definition = self
            .plan
            .resolution(resolution)
            .ok_or_else(|| TaskFailure::new(tf!("runner.unknown_resolution", resolution)))?;
        if &definition.build != build {
            return Err(TaskFailure::new(tf!(
                "runner.foreign_resolution",
                resolution,
                &definition.build,
                build
            )));
        }

        debug!(build = %build, resolution, "resolving task dependencies");
        let result = definition.to_result();
        self.orchestrator
            .build_all(build, &result)
            .await
            .map(|_| ())
            .map_err(|err| TaskFailure::new(tf!("runner.resolution_failed", resolution, err)))
    }

    /// 在构建目录中执行命令
    async fn run_command(
        &self,
        build: &BuildIdentifier,
        command_str: &str,
    ) -> Result<TaskOutput, TaskFailure> {
        let start_time = Instant::now();
        let working_directory = self
            .plan
            .build(build)
            .map(|definition| self.base_dir.join(&definition.dir))
            .unwrap_or_else(|| self.base_dir.clone());

        let mut command = shell_command(command_str);
        command
            .current_dir(&working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if self.verbose {
            Logger::info(tf!("runner.command_run", build, command_str));
        }

        let output = command.output().await.map_err(|err| {
            TaskFailure::new(tf!("runner.command_spawn_failed", command_str, err))
        })?;

        let duration = start_time.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        // 在详细模式下输出命令输出
        if self.verbose {
            if !stdout.trim().is_empty() {
                Logger::info(tf!("runner.command_stdout", stdout.trim_end()));
            }
            if !stderr.trim().is_empty() {
                Logger::warn(tf!("runner.command_stderr", stderr.trim_end()));
            }
        }

        if !output.status.success() {
            let mut failure =
                TaskFailure::new(tf!("runner.command_failed", command_str, exit_code));
            if let Some(line) = stderr.lines().rev().find(|line| !line.trim().is_empty()) {
                failure.message = format!("{}: {}", failure.message, line.trim());
            }
            return Err(failure.with_exit_code(exit_code));
        }

        Ok(TaskOutput {
            exit_code,
            stdout,
            stderr,
            duration,
        })
    }
}

impl TaskRunner for CommandTaskRunner {
    async fn run(&self, build: &BuildIdentifier, task: &str) -> Result<TaskOutput, TaskFailure> {
        let definition = self.plan.task(build, task).ok_or_else(|| {
            TaskFailure::new(tf!("runner.unknown_task", format!("{}:{}", build, task)))
        })?;

        if let Some(resolution) = &definition.resolves {
            self.resolve(build, resolution).await?;
        }

        match &definition.command {
            Some(command) => self.run_command(build, command).await,
            None => Ok(TaskOutput::success(String::new(), Duration::ZERO)),
        }
    }
}

/// 按平台选择 shell
fn shell_command(command_str: &str) -> Command {
    if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(command_str);
        command
    } else {
        let mut command = Command::new("sh");
        command.arg("-c").arg(command_str);
        command
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::coordinator::TaskGraphCoordinator;
    use crate::models::plan::TaskDefinition;
    use crate::models::TaskState;

    const PLAN: &str = r#"
root = "app"

[[builds]]
name = "app"
[builds.tasks.noop]
[builds.tasks.hello]
command = "echo hello from $(basename \"$(pwd -P)\")"
[builds.tasks.broken]
command = "echo bad input >&2; exit 3"
[builds.tasks.compile]
resolves = "app-compile"

[[builds]]
name = "lib"
dir = "lib"

[[resolutions]]
name = "app-compile"
build = "app"
[[resolutions.edges]]
from = "app::"
selected = "lib::core"
[[resolutions.artifacts]]
component = "lib::core"
file = "lib/core.jar"
tasks = ["jar"]
"#;

    fn runner(base_dir: PathBuf) -> (Arc<TaskGraphCoordinator>, CommandTaskRunner) {
        let plan = Arc::new(CompositePlan::parse(PLAN).unwrap());
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let orchestrator = ArtifactBuildOrchestrator::new(Arc::clone(&coordinator));
        (coordinator, CommandTaskRunner::new(plan, base_dir, orchestrator))
    }

    #[tokio::test]
    async fn runs_command_in_build_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (_, runner) = runner(dir.path().to_path_buf());

        let output = runner.run(&"app".into(), "hello").await.unwrap();
        let expected = dir.path().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.trim(), format!("hello from {}", expected));
    }

    #[tokio::test]
    async fn task_without_command_succeeds() {
        let (_, runner) = runner(PathBuf::from("."));
        let output = runner.run(&"app".into(), "noop").await.unwrap();
        assert_eq!(output.exit_code, 0);
    }

    #[tokio::test]
    async fn non_zero_exit_becomes_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (_, runner) = runner(dir.path().to_path_buf());

        let failure = runner.run(&"app".into(), "broken").await.unwrap_err();
        assert_eq!(failure.exit_code, Some(3));
        assert!(failure.message.ends_with("bad input"));
    }

    #[tokio::test]
    async fn unknown_task_fails() {
        let (_, runner) = runner(PathBuf::from("."));
        assert!(runner.run(&"lib".into(), "missing").await.is_err());
    }

    #[tokio::test]
    async fn resolves_dependencies_before_running() {
        let (coordinator, runner) = runner(PathBuf::from("."));
        let lib = BuildIdentifier::new("lib");
        // 模拟 lib 已经产出了制品
        coordinator.mark_completed(&lib, "jar");

        runner.run(&"app".into(), "compile").await.unwrap();
        assert_eq!(coordinator.requesters(&lib, "jar"), vec![BuildIdentifier::new("app")]);
    }

    #[tokio::test]
    async fn refuses_to_resolve_for_another_build() {
        let mut plan = CompositePlan::parse(PLAN).unwrap();
        let lib = BuildIdentifier::new("lib");
        let lib_build = plan.builds.iter_mut().find(|b| b.name == lib).unwrap();
        lib_build.tasks.insert(
            "test".to_string(),
            TaskDefinition {
                command: None,
                resolves: Some("app-compile".to_string()),
            },
        );
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let orchestrator = ArtifactBuildOrchestrator::new(Arc::clone(&coordinator));
        let runner = CommandTaskRunner::new(Arc::new(plan), PathBuf::from("."), orchestrator);

        let failure = runner.run(&lib, "test").await.unwrap_err();
        assert!(failure.message.contains("'app-compile'"));
        assert!(failure.message.contains("'app'"));
        // lib:jar 不会被当作已就绪
        assert_eq!(coordinator.task_state(&lib, "jar"), TaskState::Unregistered);
        assert_eq!(coordinator.summary().requested, 0);
    }
}
