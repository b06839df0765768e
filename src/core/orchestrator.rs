// ============================================================================
// Compox - 制品构建编排器
// ============================================================================
//
// 文件: src/core/orchestrator.rs
// 职责: 依赖解析期间构建其他构建产出的制品
// 边界:
//   - ✅ 批量模式: build_all(当前构建, 解析结果)
//   - ✅ 增量模式: add(请求构建, 制品) + build_all()
//   - ✅ 没有跨构建制品时的快速路径
//   - ❌ 不包含任务执行逻辑
//   - ❌ 不包含状态机维护（由协调器负责）
//
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::coordinator::TaskGraphCoordinator;
use crate::core::graph::RequestingBuildsIndex;
use crate::core::registrar::TaskRequestRegistrar;
use crate::error::CompositeResult;
use crate::models::{
    ArtifactRequest, BuildIdentifier, FileCollection, ResolvableDependencies, TaskKey,
    TaskRequestRecord,
};

/// 制品构建编排器
///
/// 批量模式和增量模式共享同一个协调器。
#[derive(Clone)]
pub struct ArtifactBuildOrchestrator {
    coordinator: Arc<TaskGraphCoordinator>,
}

impl ArtifactBuildOrchestrator {
    pub fn new(coordinator: Arc<TaskGraphCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<TaskGraphCoordinator> {
        &self.coordinator
    }

    /// 确保解析结果中由其他构建产出的制品全部构建完成，返回制品文件
    ///
    /// 没有跨构建制品时立即返回，不做任何登记。
    pub async fn build_all<D>(
        &self,
        current: &BuildIdentifier,
        dependencies: &D,
    ) -> CompositeResult<FileCollection>
    where
        D: ResolvableDependencies,
    {
        let artifacts = dependencies.artifacts();
        let requests: Vec<&ArtifactRequest> = artifacts
            .artifacts()
            .iter()
            .filter_map(|artifact| artifact.id.cross_build_request(current))
            .collect();

        if requests.is_empty() {
            debug!(build = %current, "no artifacts from other builds");
            return Ok(artifacts.artifact_files());
        }

        let index = RequestingBuildsIndex::from_dependencies(dependencies.all_dependencies());
        for cycle in index.build_cycles() {
            let builds: Vec<&str> = cycle.iter().map(BuildIdentifier::name).collect();
            warn!(build = %current, cycle = %builds.join(", "), "builds depend on each other");
        }

        let mut registrar = TaskRequestRegistrar::new();
        registrar.register_all(&index, requests.iter().copied(), current);
        let records = registrar.submit(&self.coordinator);
        debug!(build = %current, tasks = records.len(), "cross-build tasks registered");

        await_records(&self.coordinator, current, &records).await?;
        Ok(artifacts.artifact_files())
    }

    /// 开始一个增量会话
    pub fn incremental(&self, current: BuildIdentifier) -> IncrementalArtifactBuilder {
        IncrementalArtifactBuilder {
            coordinator: Arc::clone(&self.coordinator),
            current,
            registrar: TaskRequestRegistrar::new(),
        }
    }
}

/// 增量制品构建会话
///
/// `add` 只累积记录，`build_all` 一次性登记并等待全部记录，然后清空。
pub struct IncrementalArtifactBuilder {
    coordinator: Arc<TaskGraphCoordinator>,
    current: BuildIdentifier,
    registrar: TaskRequestRegistrar,
}

impl IncrementalArtifactBuilder {
    /// 记录 requesting 构建需要的制品，返回新增记录数
    pub fn add(&mut self, requesting: &BuildIdentifier, artifact: &ArtifactRequest) -> usize {
        self.registrar.register(requesting, artifact)
    }

    /// 尚未构建的记录
    pub fn pending(&self) -> &[TaskRequestRecord] {
        self.registrar.records()
    }

    pub fn current_build(&self) -> &BuildIdentifier {
        &self.current
    }

    /// 登记并等待全部累积的记录
    ///
    /// 只有全部记录都完成后才清空；失败后再次调用会重新等待并返回同样的错误。
    pub async fn build_all(&mut self) -> CompositeResult<()> {
        if self.registrar.is_empty() {
            return Ok(());
        }
        let records = self.registrar.publish(&self.coordinator).to_vec();
        debug!(build = %self.current, tasks = records.len(), "cross-build tasks registered");

        await_records(&self.coordinator, &self.current, &records).await?;
        self.registrar.drain();
        Ok(())
    }
}

/// 按登记顺序等待记录中的每个目标任务（相同任务只等待一次）
async fn await_records(
    coordinator: &TaskGraphCoordinator,
    waiting: &BuildIdentifier,
    records: &[TaskRequestRecord],
) -> CompositeResult<()> {
    let mut awaited: HashSet<TaskKey> = HashSet::new();
    for record in records {
        let key = record.target_key();
        if awaited.insert(key.clone()) {
            coordinator
                .await_completion_from(waiting, &key.build, &key.task)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompositeError;
    use crate::models::{
        ComponentArtifactIdentifier, ComponentIdentifier, DependencyResult,
        ProjectComponentIdentifier, ResolutionResult, ResolvedArtifactResult, TaskFailure,
        TaskState,
    };
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn project_artifact(build: &str, tasks: &[&str], file: &str) -> ResolvedArtifactResult {
        ResolvedArtifactResult {
            id: ComponentArtifactIdentifier::Project(ArtifactRequest::new(
                ProjectComponentIdentifier::new(build, "core"),
                tasks.iter().copied(),
            )),
            file: PathBuf::from(file),
        }
    }

    fn external_artifact(file: &str) -> ResolvedArtifactResult {
        ResolvedArtifactResult {
            id: ComponentArtifactIdentifier::External {
                component: ComponentIdentifier::module("org.slf4j", "slf4j-api", "2.0.9"),
                name: "slf4j-api.jar".to_string(),
            },
            file: PathBuf::from(file),
        }
    }

    fn edge(from: &str, selected: &str) -> DependencyResult {
        DependencyResult::resolved(from.parse().unwrap(), selected.parse().unwrap())
    }

    fn orchestrator() -> ArtifactBuildOrchestrator {
        ArtifactBuildOrchestrator::new(Arc::new(TaskGraphCoordinator::default()))
    }

    /// 简单的执行引擎：按队列顺序执行任务，failing 中的任务失败
    fn spawn_engine(
        coordinator: &Arc<TaskGraphCoordinator>,
        build: &str,
        failing: &'static [&'static str],
    ) -> JoinHandle<Vec<String>> {
        let coordinator = Arc::clone(coordinator);
        let mut queue = coordinator.attach_build(&build.into()).unwrap();
        tokio::spawn(async move {
            let mut executed = Vec::new();
            while let Some(task) = queue.next().await {
                let build = queue.build().clone();
                coordinator.mark_running(&build, &task);
                if failing.contains(&task.as_str()) {
                    coordinator.mark_failed(&build, &task, TaskFailure::new("boom"));
                } else {
                    coordinator.mark_completed(&build, &task);
                }
                executed.push(task);
            }
            executed
        })
    }

    #[tokio::test]
    async fn fast_path_registers_nothing() {
        let orchestrator = orchestrator();
        let result = ResolutionResult::new(
            vec![edge("app::", "app::util")],
            vec![
                external_artifact("cache/slf4j-api.jar"),
                project_artifact("app", &["jar"], "app/util.jar"),
            ],
        );

        let files = orchestrator.build_all(&"app".into(), &result).await.unwrap();

        assert_eq!(
            files.files(),
            &[PathBuf::from("cache/slf4j-api.jar"), PathBuf::from("app/util.jar")]
        );
        assert_eq!(orchestrator.coordinator().summary().requested, 0);
    }

    #[tokio::test]
    async fn round_trip_completes_and_replays() {
        let orchestrator = orchestrator();
        let engine = spawn_engine(orchestrator.coordinator(), "b", &[]);
        let result = ResolutionResult::new(
            vec![edge("a::", "b::core")],
            vec![project_artifact("b", &["jar"], "b/core.jar")],
        );

        let files = timeout(WAIT, orchestrator.build_all(&"a".into(), &result))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(files.len(), 1);

        let coordinator = orchestrator.coordinator();
        assert_eq!(coordinator.task_state(&"b".into(), "jar"), TaskState::Completed);
        assert_eq!(coordinator.requesters(&"b".into(), "jar"), vec![BuildIdentifier::new("a")]);
        // 完成之后的等待者立即返回
        assert_eq!(coordinator.await_completion(&"b".into(), "jar").await, Ok(()));

        coordinator.close();
        assert_eq!(engine.await.unwrap(), vec!["jar".to_string()]);
    }

    #[tokio::test]
    async fn initiating_build_becomes_requester_without_graph_edges() {
        let orchestrator = orchestrator();
        let engine = spawn_engine(orchestrator.coordinator(), "lib", &[]);
        let result = ResolutionResult::new(vec![], vec![project_artifact("lib", &["jar"], "lib.jar")]);

        timeout(WAIT, orchestrator.build_all(&"root".into(), &result))
            .await
            .unwrap()
            .unwrap();

        let coordinator = orchestrator.coordinator();
        assert_eq!(coordinator.requesters(&"lib".into(), "jar"), vec![BuildIdentifier::new("root")]);
        coordinator.close();
        engine.await.unwrap();
    }

    #[tokio::test]
    async fn only_project_artifacts_are_scheduled() {
        let orchestrator = orchestrator();
        let engine = spawn_engine(orchestrator.coordinator(), "c", &[]);
        let result = ResolutionResult::new(
            vec![edge("app::", "c::core")],
            vec![
                external_artifact("cache/slf4j-api.jar"),
                project_artifact("c", &["assemble"], "c/core.jar"),
            ],
        );

        let files = timeout(WAIT, orchestrator.build_all(&"app".into(), &result))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(files.len(), 2);

        let coordinator = orchestrator.coordinator();
        assert_eq!(coordinator.summary().requested, 1);
        coordinator.close();
        assert_eq!(engine.await.unwrap(), vec!["assemble".to_string()]);
    }

    #[tokio::test]
    async fn task_failure_aborts_build_all() {
        let orchestrator = orchestrator();
        let engine = spawn_engine(orchestrator.coordinator(), "lib", &["jar"]);
        let result = ResolutionResult::new(
            vec![edge("app::", "lib::core")],
            vec![project_artifact("lib", &["jar"], "lib.jar")],
        );

        let err = timeout(WAIT, orchestrator.build_all(&"app".into(), &result))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(
            err,
            CompositeError::TaskExecution {
                build: "lib".into(),
                task: "jar".into(),
                cause: TaskFailure::new("boom"),
            }
        );
        orchestrator.coordinator().close();
        engine.await.unwrap();
    }

    #[tokio::test]
    async fn mutual_build_dependencies_fail_fast() {
        let orchestrator = orchestrator();
        let a_needs_b = ResolutionResult::new(
            vec![edge("a::", "b::core")],
            vec![project_artifact("b", &["jar"], "b.jar")],
        );
        let b_needs_a = ResolutionResult::new(
            vec![edge("b::", "a::core")],
            vec![project_artifact("a", &["jar"], "a.jar")],
        );

        let a_session = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.build_all(&"a".into(), &a_needs_b).await })
        };
        let coordinator = orchestrator.coordinator();
        timeout(WAIT, async {
            while coordinator.waiting_on(&"a".into()).is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let err = timeout(WAIT, orchestrator.build_all(&"b".into(), &b_needs_a))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, CompositeError::CyclicBuildDependency { .. }));

        coordinator.cancel();
        let a_result = timeout(WAIT, a_session).await.unwrap().unwrap();
        assert_eq!(a_result, Err(CompositeError::Cancelled));
    }

    #[tokio::test]
    async fn incremental_session_accumulates_then_drains() {
        let orchestrator = orchestrator();
        let engine = spawn_engine(orchestrator.coordinator(), "lib", &[]);
        let mut session = orchestrator.incremental("app".into());

        let core = ArtifactRequest::new(ProjectComponentIdentifier::new("lib", "core"), ["jar"]);
        let api = ArtifactRequest::new(ProjectComponentIdentifier::new("lib", "api"), ["jar", "docs"]);
        assert_eq!(session.add(&"app".into(), &core), 1);
        assert_eq!(session.add(&"tools".into(), &core), 1);
        assert_eq!(session.add(&"app".into(), &api), 1);
        assert_eq!(session.pending().len(), 3);

        // 登记之前任务不会执行
        assert_eq!(
            orchestrator.coordinator().task_state(&"lib".into(), "jar"),
            TaskState::Unregistered
        );

        timeout(WAIT, session.build_all()).await.unwrap().unwrap();
        assert!(session.pending().is_empty());
        assert_eq!(session.current_build(), &BuildIdentifier::new("app"));

        let coordinator = orchestrator.coordinator();
        assert_eq!(
            coordinator.requesters(&"lib".into(), "jar"),
            vec![BuildIdentifier::new("app"), BuildIdentifier::new("tools")]
        );
        // 再次 build_all 没有需要等待的记录
        assert_eq!(session.build_all().await, Ok(()));

        coordinator.close();
        let mut executed = engine.await.unwrap();
        executed.sort();
        assert_eq!(executed, vec!["docs".to_string(), "jar".to_string()]);
    }

    #[tokio::test]
    async fn failed_incremental_flush_keeps_its_records() {
        let orchestrator = orchestrator();
        let coordinator = orchestrator.coordinator();
        let mut session = orchestrator.incremental("app".into());
        session.add(
            &"app".into(),
            &ArtifactRequest::new(ProjectComponentIdentifier::new("lib", "core"), ["jar"]),
        );
        coordinator.mark_failed(&"lib".into(), "jar", TaskFailure::new("boom"));

        let expected = CompositeError::TaskExecution {
            build: "lib".into(),
            task: "jar".into(),
            cause: TaskFailure::new("boom"),
        };
        let first = timeout(WAIT, session.build_all()).await.unwrap();
        assert_eq!(first, Err(expected.clone()));
        assert_eq!(session.pending().len(), 1);

        // 失败不会被遗忘
        let second = timeout(WAIT, session.build_all()).await.unwrap();
        assert_eq!(second, Err(expected));
        assert_eq!(session.pending().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_incremental_flush_reports_cancellation_again() {
        let orchestrator = orchestrator();
        let coordinator = orchestrator.coordinator();
        let mut session = orchestrator.incremental("app".into());
        session.add(
            &"app".into(),
            &ArtifactRequest::new(ProjectComponentIdentifier::new("lib", "core"), ["jar"]),
        );
        coordinator.cancel();

        assert_eq!(session.build_all().await, Err(CompositeError::Cancelled));
        assert_eq!(session.build_all().await, Err(CompositeError::Cancelled));
        assert_eq!(coordinator.summary().requested, 1);
    }
}
