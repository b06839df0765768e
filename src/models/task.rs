// ============================================================================
// Compox - 任务数据模型
// ============================================================================
//
// 文件: src/models/task.rs
// 职责: 跨构建任务调度相关的数据结构定义
// 边界:
//   - ✅ 任务键 (构建, 任务名) 定义
//   - ✅ 任务请求记录定义
//   - ✅ 任务状态枚举定义
//   - ✅ 任务执行结果与失败原因定义
//   - ❌ 不应包含任务执行逻辑
//   - ❌ 不应包含任务调度逻辑
//
// ============================================================================

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::models::build::BuildIdentifier;

/// 任务键：某个构建内的某个任务
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    pub build: BuildIdentifier,
    pub task: String,
}

impl TaskKey {
    pub fn new(build: BuildIdentifier, task: impl Into<String>) -> Self {
        Self {
            build,
            task: task.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.build, self.task)
    }
}

/// 任务请求记录：requesting 构建需要 target 构建执行 task
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRequestRecord {
    pub requesting_build: BuildIdentifier,
    pub target_build: BuildIdentifier,
    pub task: String,
}

impl TaskRequestRecord {
    pub fn new(
        requesting_build: BuildIdentifier,
        target_build: BuildIdentifier,
        task: impl Into<String>,
    ) -> Self {
        Self {
            requesting_build,
            target_build,
            task: task.into(),
        }
    }

    /// 被请求的任务键
    pub fn target_key(&self) -> TaskKey {
        TaskKey::new(self.target_build.clone(), self.task.clone())
    }
}

impl fmt::Display for TaskRequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}:{}",
            self.requesting_build, self.target_build, self.task
        )
    }
}

/// 任务失败原因（可复制，以便重放给每个等待者）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TaskFailure {
    /// 失败描述
    pub message: String,
    /// 进程退出码（如果有）
    pub exit_code: Option<i32>,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }
}

/// 任务状态
///
/// `Unregistered → Registered → Running → Completed | Failed`，
/// 终止状态单向且不可逆。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// 尚未登记（只有等待者）
    Unregistered,
    /// 已登记，等待执行
    Registered,
    /// 正在执行
    Running,
    /// 执行成功
    Completed,
    /// 执行失败
    Failed(TaskFailure),
}

impl TaskState {
    /// 判断是否已到达终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed(_))
    }

    /// 状态序号，用于保证单向迁移
    pub(crate) fn rank(&self) -> u8 {
        match self {
            TaskState::Unregistered => 0,
            TaskState::Registered => 1,
            TaskState::Running => 2,
            TaskState::Completed | TaskState::Failed(_) => 3,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Unregistered => write!(f, "Unregistered"),
            TaskState::Registered => write!(f, "Registered"),
            TaskState::Running => write!(f, "Running"),
            TaskState::Completed => write!(f, "Completed"),
            TaskState::Failed(_) => write!(f, "Failed"),
        }
    }
}

/// 任务执行输出
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    /// 退出状态码
    pub exit_code: i32,
    /// 标准输出
    pub stdout: String,
    /// 标准错误输出
    pub stderr: String,
    /// 执行时长
    pub duration: Duration,
}

impl TaskOutput {
    /// 创建成功结果
    pub fn success(stdout: String, duration: Duration) -> Self {
        Self {
            exit_code: 0,
            stdout,
            stderr: String::new(),
            duration,
        }
    }
}
