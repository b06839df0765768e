// ============================================================================
// Compox - 跨构建任务图协调器
// ============================================================================
//
// 文件: src/core/coordinator.rs
// 职责: 所有构建共享的任务登记、状态追踪与等待完成
// 边界:
//   - ✅ 任务登记 (add_task) 与去重
//   - ✅ 每个 (构建, 任务) 的状态机
//   - ✅ 等待完成 (await_completion) 与广播
//   - ✅ 构建级循环等待检测
//   - ✅ 全局取消
//   - ❌ 不包含任务的具体执行
//   - ❌ 不包含依赖图推导
//   - ❌ 不包含 UI 显示逻辑
//
// 并发设计:
// - registry 互斥锁只在查找/插入时短暂持有，等待期间不持有任何锁
// - 完成信号通过每个任务独立的 watch 通道广播
// - 等待图 (waits) 使用独立的互斥锁
//
// ============================================================================

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{CompositeError, CompositeResult};
use crate::models::config::Config;
use crate::models::{BuildIdentifier, TaskFailure, TaskKey, TaskState};

/// 协调器配置
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// 任一任务失败时取消整个构建
    pub fail_fast: bool,
}

impl CoordinatorConfig {
    /// 从全局配置创建
    pub fn from_config() -> Self {
        Self {
            fail_fast: Config::current().execution.fail_fast,
        }
    }
}

/// 协调器执行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorSummary {
    /// 被至少一个构建请求过的任务数
    pub requested: usize,
    /// 已登记尚未开始
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// 单个任务的登记信息
struct TaskEntry {
    state: watch::Sender<TaskState>,
    /// 请求该任务的构建（按插入顺序）
    requesters: Vec<BuildIdentifier>,
    /// 是否已投递到构建的执行队列
    queued: bool,
    /// 登记顺序
    sequence: u64,
}

impl TaskEntry {
    fn new(sequence: u64) -> Self {
        let (state, _) = watch::channel(TaskState::Unregistered);
        Self {
            state,
            requesters: Vec::new(),
            queued: false,
            sequence,
        }
    }

    /// 单向迁移状态，返回是否发生了迁移
    fn advance(&self, next: TaskState) -> bool {
        self.state.send_if_modified(|state| {
            if next.rank() > state.rank() {
                *state = next;
                true
            } else {
                false
            }
        })
    }
}

#[derive(Default)]
struct Registry {
    tasks: HashMap<TaskKey, TaskEntry>,
    queues: HashMap<BuildIdentifier, mpsc::UnboundedSender<String>>,
    next_sequence: u64,
}

impl Registry {
    fn entry(&mut self, key: &TaskKey) -> &mut TaskEntry {
        let next_sequence = &mut self.next_sequence;
        self.tasks.entry(key.clone()).or_insert_with(|| {
            let sequence = *next_sequence;
            *next_sequence += 1;
            TaskEntry::new(sequence)
        })
    }
}

/// 构建之间的等待关系图：waiting -> target
#[derive(Default)]
struct WaitGraph {
    edges: HashMap<BuildIdentifier, HashMap<BuildIdentifier, usize>>,
}

impl WaitGraph {
    /// 查找 from 到 to 的等待路径（包含两端）
    fn path(&self, from: &BuildIdentifier, to: &BuildIdentifier) -> Option<Vec<BuildIdentifier>> {
        let mut parents: HashMap<&BuildIdentifier, &BuildIdentifier> = HashMap::new();
        let mut visited: HashSet<&BuildIdentifier> = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut chain = vec![current.clone()];
                let mut node = current;
                while let Some(&parent) = parents.get(node) {
                    chain.push(parent.clone());
                    node = parent;
                }
                chain.reverse();
                return Some(chain);
            }
            for next in self.edges.get(current).into_iter().flat_map(HashMap::keys) {
                if visited.insert(next) {
                    parents.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    fn enter(&mut self, waiting: &BuildIdentifier, target: &BuildIdentifier) -> CompositeResult<()> {
        if let Some(mut chain) = self.path(target, waiting) {
            chain.push(target.clone());
            return Err(CompositeError::CyclicBuildDependency {
                waiting: waiting.clone(),
                target: target.clone(),
                chain,
            });
        }
        *self
            .edges
            .entry(waiting.clone())
            .or_default()
            .entry(target.clone())
            .or_insert(0) += 1;
        Ok(())
    }

    fn leave(&mut self, waiting: &BuildIdentifier, target: &BuildIdentifier) {
        if let Some(targets) = self.edges.get_mut(waiting) {
            if let Some(count) = targets.get_mut(target) {
                *count -= 1;
                if *count == 0 {
                    targets.remove(target);
                }
            }
            if targets.is_empty() {
                self.edges.remove(waiting);
            }
        }
    }
}

/// 等待期间保持 waiting -> target 边，结束时移除
struct WaitGuard<'a> {
    waits: &'a Mutex<WaitGraph>,
    waiting: BuildIdentifier,
    target: BuildIdentifier,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        lock(self.waits).leave(&self.waiting, &self.target);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 构建的任务执行队列
///
/// 由构建的执行引擎持有，按登记顺序接收需要执行的任务名。
#[derive(Debug)]
pub struct BuildTaskQueue {
    build: BuildIdentifier,
    receiver: mpsc::UnboundedReceiver<String>,
}

impl BuildTaskQueue {
    pub fn build(&self) -> &BuildIdentifier {
        &self.build
    }

    /// 下一个需要执行的任务；协调器关闭后返回 None
    pub async fn next(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// 非阻塞地取出下一个任务
    pub fn try_next(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}

/// 跨构建任务图协调器
pub struct TaskGraphCoordinator {
    config: CoordinatorConfig,
    registry: Mutex<Registry>,
    waits: Mutex<WaitGraph>,
    cancellation: CancellationToken,
}

impl Default for TaskGraphCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl TaskGraphCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry::default()),
            waits: Mutex::new(WaitGraph::default()),
            cancellation: CancellationToken::new(),
        }
    }

    /// 从全局配置创建协调器
    pub fn new_from_config() -> Self {
        Self::new(CoordinatorConfig::from_config())
    }

    /// 登记 requesting 构建需要 target 构建执行 task
    ///
    /// 不阻塞。同一个任务只会从 `Unregistered` 迁移一次、投递一次；
    /// 返回本次调用是否完成了登记。
    pub fn add_task(
        &self,
        requesting: &BuildIdentifier,
        target: &BuildIdentifier,
        task: &str,
    ) -> bool {
        let key = TaskKey::new(target.clone(), task);
        let mut registry = lock(&self.registry);

        let entry = registry.entry(&key);
        if !entry.requesters.contains(requesting) {
            entry.requesters.push(requesting.clone());
        }
        if !entry.advance(TaskState::Registered) {
            trace!(task = %key, requester = %requesting, "task already registered");
            return false;
        }

        debug!(task = %key, requester = %requesting, "task registered");
        let Registry { tasks, queues, .. } = &mut *registry;
        if let (Some(queue), Some(entry)) = (queues.get(target), tasks.get_mut(&key)) {
            entry.queued = queue.send(key.task.clone()).is_ok();
        }
        true
    }

    /// 订阅构建的执行队列
    ///
    /// 订阅前已登记的任务会按登记顺序立即投递。
    pub fn attach_build(&self, build: &BuildIdentifier) -> CompositeResult<BuildTaskQueue> {
        let mut registry = lock(&self.registry);
        let Registry { tasks, queues, .. } = &mut *registry;

        if queues.get(build).is_some_and(|queue| !queue.is_closed()) {
            return Err(CompositeError::BuildAlreadyAttached(build.clone()));
        }

        let (sender, receiver) = mpsc::unbounded_channel();

        let mut backlog: Vec<(&TaskKey, &mut TaskEntry)> = tasks
            .iter_mut()
            .filter(|(key, entry)| {
                &key.build == build && !entry.queued && *entry.state.borrow() == TaskState::Registered
            })
            .collect();
        backlog.sort_by_key(|(_, entry)| entry.sequence);
        for (key, entry) in backlog {
            entry.queued = sender.send(key.task.clone()).is_ok();
        }

        debug!(build = %build, "executor attached");
        queues.insert(build.clone(), sender);
        Ok(BuildTaskQueue {
            build: build.clone(),
            receiver,
        })
    }

    /// 标记任务开始执行
    pub fn mark_running(&self, build: &BuildIdentifier, task: &str) -> bool {
        self.transition(build, task, TaskState::Running)
    }

    /// 标记任务执行成功
    pub fn mark_completed(&self, build: &BuildIdentifier, task: &str) -> bool {
        self.transition(build, task, TaskState::Completed)
    }

    /// 标记任务执行失败；失败只记录一次
    pub fn mark_failed(&self, build: &BuildIdentifier, task: &str, cause: TaskFailure) -> bool {
        let transitioned = self.transition(build, task, TaskState::Failed(cause));
        if transitioned && self.config.fail_fast {
            warn!(build = %build, task, "task failed, cancelling build (fail fast)");
            self.cancel();
        }
        transitioned
    }

    fn transition(&self, build: &BuildIdentifier, task: &str, next: TaskState) -> bool {
        let key = TaskKey::new(build.clone(), task);
        let state_name = next.to_string();
        let transitioned = lock(&self.registry).entry(&key).advance(next);
        if transitioned {
            debug!(task = %key, state = %state_name, "task state changed");
        } else {
            trace!(task = %key, state = %state_name, "ignored state change");
        }
        transitioned
    }

    /// 等待 target 构建完成 task
    ///
    /// 可以在 `add_task` 之前调用。成功返回 `Ok`，任务失败返回
    /// [`CompositeError::TaskExecution`]，构建被取消返回 [`CompositeError::Cancelled`]。
    pub async fn await_completion(&self, target: &BuildIdentifier, task: &str) -> CompositeResult<()> {
        self.wait_terminal(&TaskKey::new(target.clone(), task)).await
    }

    /// 以 waiting 构建的身份等待 target 构建完成 task
    ///
    /// 如果 target 已经（直接或间接）在等待 waiting，立即返回
    /// [`CompositeError::CyclicBuildDependency`]，而不是永久阻塞。
    pub async fn await_completion_from(
        &self,
        waiting: &BuildIdentifier,
        target: &BuildIdentifier,
        task: &str,
    ) -> CompositeResult<()> {
        let key = TaskKey::new(target.clone(), task);

        // 已完成的任务无需等待，也不会形成循环
        if let Some(outcome) = self.current_outcome(&key) {
            return outcome;
        }
        if waiting == target {
            return self.wait_terminal(&key).await;
        }

        let _guard = self.enter_wait(waiting, target)?;
        self.wait_terminal(&key).await
    }

    fn enter_wait(
        &self,
        waiting: &BuildIdentifier,
        target: &BuildIdentifier,
    ) -> CompositeResult<WaitGuard<'_>> {
        lock(&self.waits).enter(waiting, target).inspect_err(|err| {
            warn!(waiting = %waiting, target = %target, "{}", err);
        })?;
        Ok(WaitGuard {
            waits: &self.waits,
            waiting: waiting.clone(),
            target: target.clone(),
        })
    }

    fn current_outcome(&self, key: &TaskKey) -> Option<CompositeResult<()>> {
        let registry = lock(&self.registry);
        let entry = registry.tasks.get(key)?;
        let state = entry.state.borrow().clone();
        outcome(key, state)
    }

    async fn wait_terminal(&self, key: &TaskKey) -> CompositeResult<()> {
        let mut receiver = lock(&self.registry).entry(key).state.subscribe();

        let current = receiver.borrow_and_update().clone();
        if let Some(result) = outcome(key, current) {
            return result;
        }

        trace!(task = %key, "waiting for task");
        let terminal = async {
            receiver
                .wait_for(TaskState::is_terminal)
                .await
                .map(|state| state.clone())
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(CompositeError::Cancelled),
            state = terminal => match state {
                Ok(state) => outcome(key, state).unwrap_or(Err(CompositeError::Cancelled)),
                Err(_) => Err(CompositeError::Cancelled),
            },
        }
    }

    /// 取消整个构建，所有等待者立即返回 [`CompositeError::Cancelled`]
    pub fn cancel(&self) {
        if !self.cancellation.is_cancelled() {
            debug!("coordinator cancelled");
        }
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// 取消令牌（供执行引擎监听）
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// 关闭所有执行队列，已订阅的执行引擎处理完剩余任务后退出
    pub fn close(&self) {
        lock(&self.registry).queues.clear();
    }

    /// 查询任务状态
    pub fn task_state(&self, build: &BuildIdentifier, task: &str) -> TaskState {
        lock(&self.registry)
            .tasks
            .get(&TaskKey::new(build.clone(), task))
            .map(|entry| entry.state.borrow().clone())
            .unwrap_or(TaskState::Unregistered)
    }

    /// 请求过该任务的构建
    pub fn requesters(&self, build: &BuildIdentifier, task: &str) -> Vec<BuildIdentifier> {
        lock(&self.registry)
            .tasks
            .get(&TaskKey::new(build.clone(), task))
            .map(|entry| entry.requesters.clone())
            .unwrap_or_default()
    }

    /// waiting 构建当前正在等待的构建
    pub fn waiting_on(&self, waiting: &BuildIdentifier) -> Vec<BuildIdentifier> {
        let mut targets: Vec<BuildIdentifier> = lock(&self.waits)
            .edges
            .get(waiting)
            .map(|targets| targets.keys().cloned().collect())
            .unwrap_or_default();
        targets.sort();
        targets
    }

    /// 当前执行统计
    pub fn summary(&self) -> CoordinatorSummary {
        let registry = lock(&self.registry);
        let mut summary = CoordinatorSummary::default();

        for entry in registry.tasks.values() {
            if !entry.requesters.is_empty() {
                summary.requested += 1;
            }
            match &*entry.state.borrow() {
                TaskState::Unregistered => {}
                TaskState::Registered => summary.pending += 1,
                TaskState::Running => summary.running += 1,
                TaskState::Completed => summary.completed += 1,
                TaskState::Failed(_) => summary.failed += 1,
            }
        }

        summary
    }
}

/// 终止状态对应的等待结果；非终止状态返回 None
fn outcome(key: &TaskKey, state: TaskState) -> Option<CompositeResult<()>> {
    match state {
        TaskState::Completed => Some(Ok(())),
        TaskState::Failed(cause) => Some(Err(CompositeError::TaskExecution {
            build: key.build.clone(),
            task: key.task.clone(),
            cause,
        })),
        TaskState::Unregistered | TaskState::Registered | TaskState::Running => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn build(name: &str) -> BuildIdentifier {
        BuildIdentifier::new(name)
    }

    #[test]
    fn duplicate_add_task_transitions_once() {
        let coordinator = TaskGraphCoordinator::default();
        let (app, lib) = (build("app"), build("lib"));

        assert!(coordinator.add_task(&app, &lib, "jar"));
        assert!(!coordinator.add_task(&app, &lib, "jar"));
        assert_eq!(coordinator.task_state(&lib, "jar"), TaskState::Registered);
        assert_eq!(coordinator.summary().requested, 1);
    }

    #[test]
    fn second_requester_is_remembered_without_re_registering() {
        let coordinator = TaskGraphCoordinator::default();
        let lib = build("lib");

        assert!(coordinator.add_task(&build("app"), &lib, "jar"));
        assert!(!coordinator.add_task(&build("tools"), &lib, "jar"));
        assert_eq!(coordinator.requesters(&lib, "jar"), vec![build("app"), build("tools")]);
    }

    #[test]
    fn tasks_are_queued_exactly_once() {
        let coordinator = TaskGraphCoordinator::default();
        let (app, lib) = (build("app"), build("lib"));
        let mut queue = coordinator.attach_build(&lib).unwrap();

        coordinator.add_task(&app, &lib, "jar");
        coordinator.add_task(&app, &lib, "jar");
        coordinator.add_task(&build("other"), &lib, "jar");

        assert_eq!(queue.try_next().as_deref(), Some("jar"));
        assert_eq!(queue.try_next(), None);
    }

    #[test]
    fn attach_flushes_backlog_in_registration_order() {
        let coordinator = TaskGraphCoordinator::default();
        let (app, lib) = (build("app"), build("lib"));
        coordinator.add_task(&app, &lib, "jar");
        coordinator.add_task(&app, &build("other"), "jar");
        coordinator.add_task(&app, &lib, "classes");

        let mut queue = coordinator.attach_build(&lib).unwrap();
        assert_eq!(queue.build(), &lib);
        assert_eq!(queue.try_next().as_deref(), Some("jar"));
        assert_eq!(queue.try_next().as_deref(), Some("classes"));
        assert_eq!(queue.try_next(), None);
    }

    #[test]
    fn attaching_twice_is_rejected_until_first_queue_is_dropped() {
        let coordinator = TaskGraphCoordinator::default();
        let lib = build("lib");
        let queue = coordinator.attach_build(&lib).unwrap();
        assert_eq!(
            coordinator.attach_build(&lib).unwrap_err(),
            CompositeError::BuildAlreadyAttached(lib.clone())
        );
        drop(queue);
        assert!(coordinator.attach_build(&lib).is_ok());
    }

    #[test]
    fn terminal_state_is_final() {
        let coordinator = TaskGraphCoordinator::default();
        let lib = build("lib");
        coordinator.add_task(&build("app"), &lib, "jar");

        assert!(coordinator.mark_running(&lib, "jar"));
        assert!(coordinator.mark_failed(&lib, "jar", TaskFailure::new("boom")));
        assert!(!coordinator.mark_completed(&lib, "jar"));
        assert!(!coordinator.mark_failed(&lib, "jar", TaskFailure::new("again")));
        assert!(!coordinator.add_task(&build("app"), &lib, "jar"));
        assert_eq!(
            coordinator.task_state(&lib, "jar"),
            TaskState::Failed(TaskFailure::new("boom"))
        );
    }

    #[tokio::test]
    async fn await_before_add_task_unblocks_on_completion() {
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let lib = build("lib");

        let waiter = {
            let coordinator = Arc::clone(&coordinator);
            let lib = lib.clone();
            tokio::spawn(async move { coordinator.await_completion(&lib, "jar").await })
        };
        tokio::task::yield_now().await;

        coordinator.add_task(&build("app"), &lib, "jar");
        coordinator.mark_running(&lib, "jar");
        coordinator.mark_completed(&lib, "jar");

        let result = timeout(WAIT, waiter).await.unwrap().unwrap();
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn failure_is_replayed_to_every_waiter() {
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let lib = build("lib");
        coordinator.add_task(&build("app"), &lib, "jar");

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let lib = lib.clone();
                tokio::spawn(async move { coordinator.await_completion(&lib, "jar").await })
            })
            .collect();
        tokio::task::yield_now().await;

        coordinator.mark_failed(&lib, "jar", TaskFailure::new("compile error").with_exit_code(2));

        let expected = Err(CompositeError::TaskExecution {
            build: lib.clone(),
            task: "jar".to_string(),
            cause: TaskFailure::new("compile error").with_exit_code(2),
        });
        for waiter in waiters {
            assert_eq!(timeout(WAIT, waiter).await.unwrap().unwrap(), expected);
        }
        // 之后的等待者同样得到失败结果
        assert_eq!(coordinator.await_completion(&lib, "jar").await, expected);
    }

    #[tokio::test]
    async fn cancellation_unblocks_pending_waiters() {
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let lib = build("lib");
        coordinator.add_task(&build("app"), &lib, "jar");

        let waiter = {
            let coordinator = Arc::clone(&coordinator);
            let lib = lib.clone();
            tokio::spawn(async move { coordinator.await_completion(&lib, "jar").await })
        };
        tokio::task::yield_now().await;
        coordinator.cancel();

        let result = timeout(WAIT, waiter).await.unwrap().unwrap();
        assert_eq!(result, Err(CompositeError::Cancelled));
        assert!(coordinator.is_cancelled());
    }

    #[tokio::test]
    async fn completed_tasks_still_succeed_after_cancellation() {
        let coordinator = TaskGraphCoordinator::default();
        let lib = build("lib");
        coordinator.mark_completed(&lib, "jar");
        coordinator.cancel();
        assert_eq!(coordinator.await_completion(&lib, "jar").await, Ok(()));
    }

    #[tokio::test]
    async fn fail_fast_cancels_unrelated_waiters() {
        let coordinator = Arc::new(TaskGraphCoordinator::new(CoordinatorConfig { fail_fast: true }));
        let (lib, other) = (build("lib"), build("other"));
        coordinator.add_task(&build("app"), &lib, "jar");
        coordinator.add_task(&build("app"), &other, "jar");

        let waiter = {
            let coordinator = Arc::clone(&coordinator);
            let other = other.clone();
            tokio::spawn(async move { coordinator.await_completion(&other, "jar").await })
        };
        tokio::task::yield_now().await;
        coordinator.mark_failed(&lib, "jar", TaskFailure::new("boom"));

        let result = timeout(WAIT, waiter).await.unwrap().unwrap();
        assert_eq!(result, Err(CompositeError::Cancelled));
    }

    #[tokio::test]
    async fn mutual_waits_fail_fast_with_cycle() {
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let (a, b) = (build("a"), build("b"));
        coordinator.add_task(&a, &b, "jar");
        coordinator.add_task(&b, &a, "jar");

        let a_waits_for_b = {
            let coordinator = Arc::clone(&coordinator);
            let (a, b) = (a.clone(), b.clone());
            tokio::spawn(async move { coordinator.await_completion_from(&a, &b, "jar").await })
        };
        // 等待 a -> b 的等待边建立
        timeout(WAIT, async {
            while lock(&coordinator.waits).path(&a, &b).is_none() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let err = timeout(WAIT, coordinator.await_completion_from(&b, &a, "jar"))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(
            err,
            CompositeError::CyclicBuildDependency {
                waiting: b.clone(),
                target: a.clone(),
                chain: vec![a.clone(), b.clone(), a.clone()],
            }
        );

        // b 的解析失败后，b 的任务随之失败，a 不会永久阻塞
        coordinator.mark_failed(&b, "jar", TaskFailure::new(err.to_string()));
        let result = timeout(WAIT, a_waits_for_b).await.unwrap().unwrap();
        assert!(matches!(result, Err(CompositeError::TaskExecution { .. })));
    }

    #[tokio::test]
    async fn transitive_wait_chain_is_detected() {
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let (a, b, c) = (build("a"), build("b"), build("c"));

        let mut waiters = Vec::new();
        for (waiting, target) in [(a.clone(), b.clone()), (b.clone(), c.clone())] {
            let coordinator = Arc::clone(&coordinator);
            waiters.push(tokio::spawn(async move {
                coordinator.await_completion_from(&waiting, &target, "jar").await
            }));
        }
        timeout(WAIT, async {
            while lock(&coordinator.waits).path(&a, &c).is_none() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let err = coordinator.await_completion_from(&c, &a, "jar").await.unwrap_err();
        assert!(matches!(err, CompositeError::CyclicBuildDependency { .. }));

        coordinator.cancel();
        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), Err(CompositeError::Cancelled));
        }
    }

    #[tokio::test]
    async fn finished_waits_release_their_edges() {
        let coordinator = TaskGraphCoordinator::default();
        let (a, b) = (build("a"), build("b"));
        coordinator.mark_completed(&b, "jar");
        coordinator.mark_completed(&a, "jar");

        assert_eq!(coordinator.await_completion_from(&a, &b, "jar").await, Ok(()));
        assert_eq!(coordinator.await_completion_from(&b, &a, "jar").await, Ok(()));
        assert!(coordinator.waiting_on(&a).is_empty());
        assert!(coordinator.waiting_on(&b).is_empty());
    }

    #[tokio::test]
    async fn waiting_on_own_build_is_not_a_cycle() {
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let a = build("a");
        let waiter = {
            let coordinator = Arc::clone(&coordinator);
            let a = a.clone();
            tokio::spawn(async move { coordinator.await_completion_from(&a, &a, "jar").await })
        };
        tokio::task::yield_now().await;
        coordinator.mark_completed(&a, "jar");
        assert_eq!(timeout(WAIT, waiter).await.unwrap().unwrap(), Ok(()));
    }

    #[test]
    fn summary_counts_states() {
        let coordinator = TaskGraphCoordinator::default();
        let (app, lib) = (build("app"), build("lib"));
        for task in ["a", "b", "c", "d"] {
            coordinator.add_task(&app, &lib, task);
        }
        coordinator.mark_running(&lib, "b");
        coordinator.mark_completed(&lib, "c");
        coordinator.mark_failed(&lib, "d", TaskFailure::new("x"));
        // 外部驱动、无人请求的任务
        coordinator.mark_completed(&build("ext"), "e");

        assert_eq!(
            coordinator.summary(),
            CoordinatorSummary {
                requested: 4,
                pending: 1,
                running: 1,
                completed: 2,
                failed: 1,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_add_task_queues_each_task_once() {
        let coordinator = Arc::new(TaskGraphCoordinator::default());
        let (lib, util) = (build("lib"), build("util"));
        // lib 先订阅，util 在登记结束后订阅
        let mut lib_queue = coordinator.attach_build(&lib).unwrap();

        let requests: Vec<_> = (0..32)
            .map(|i| {
                let coordinator = Arc::clone(&coordinator);
                let (lib, util) = (lib.clone(), util.clone());
                tokio::spawn(async move {
                    let requester = build(&format!("consumer{}", i));
                    tokio::task::yield_now().await;
                    let first_jar = coordinator.add_task(&requester, &lib, "jar");
                    coordinator.add_task(&requester, &util, &format!("task{}", i % 4));
                    first_jar
                })
            })
            .collect();

        let mut registrations = 0;
        for request in requests {
            if timeout(WAIT, request).await.unwrap().unwrap() {
                registrations += 1;
            }
        }
        assert_eq!(registrations, 1);
        assert_eq!(coordinator.requesters(&lib, "jar").len(), 32);

        assert_eq!(lib_queue.try_next().as_deref(), Some("jar"));
        assert_eq!(lib_queue.try_next(), None);

        let mut util_queue = coordinator.attach_build(&util).unwrap();
        let mut util_tasks = Vec::new();
        while let Some(task) = util_queue.try_next() {
            util_tasks.push(task);
        }
        util_tasks.sort();
        assert_eq!(util_tasks, vec!["task0", "task1", "task2", "task3"]);
        assert_eq!(coordinator.summary().pending, 5);
    }
}
