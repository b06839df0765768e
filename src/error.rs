// ============================================================================
// Compox - 错误类型
// ============================================================================
//
// 文件: src/error.rs
// 职责: 调度层错误类型定义
// 边界:
//   - ✅ 跨构建调度错误定义
//   - ❌ 不应包含 CLI 层错误（CLI 使用 anyhow）
//
// ============================================================================

use thiserror::Error;

use crate::models::{BuildIdentifier, TaskFailure};

/// 跨构建调度错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    /// 被等待的任务执行失败
    #[error("task '{task}' in build '{build}' failed: {cause}")]
    TaskExecution {
        build: BuildIdentifier,
        task: String,
        #[source]
        cause: TaskFailure,
    },

    /// 构建之间存在相互等待
    #[error(
        "cyclic dependency between builds: '{waiting}' cannot wait for '{target}' ({})",
        format_chain(.chain)
    )]
    CyclicBuildDependency {
        waiting: BuildIdentifier,
        target: BuildIdentifier,
        /// 等待链：target -> ... -> waiting -> target
        chain: Vec<BuildIdentifier>,
    },

    /// 整个构建已被取消
    #[error("build was cancelled")]
    Cancelled,

    /// 同一个构建的执行队列只能被订阅一次
    #[error("build '{0}' already has an attached executor")]
    BuildAlreadyAttached(BuildIdentifier),
}

impl CompositeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompositeError::Cancelled)
    }
}

fn format_chain(chain: &[BuildIdentifier]) -> String {
    chain
        .iter()
        .map(BuildIdentifier::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type CompositeResult<T> = Result<T, CompositeError>;
