// ============================================================================
// Compox - 库入口
// ============================================================================
//
// 文件: src/lib.rs
// 职责: 模块声明与公共类型导出
//
// ============================================================================

//! Cross-build task coordination for composite builds.
//!
//! While one build resolves its dependencies it may discover artifacts that
//! are produced by tasks of another build. [`ArtifactBuildOrchestrator`]
//! registers those tasks with the shared [`TaskGraphCoordinator`] and waits
//! until the producing builds report them finished. Builds that end up waiting
//! on each other fail with [`CompositeError::CyclicBuildDependency`] instead
//! of blocking forever.
//!
//! ```no_run
//! use std::sync::Arc;
//! use compox::{ArtifactBuildOrchestrator, ResolutionResult, TaskGraphCoordinator};
//!
//! # async fn example(result: ResolutionResult) -> compox::CompositeResult<()> {
//! let coordinator = Arc::new(TaskGraphCoordinator::default());
//! let orchestrator = ArtifactBuildOrchestrator::new(coordinator);
//! let files = orchestrator.build_all(&"app".into(), &result).await?;
//! println!("{} artifact files ready", files.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod i18n;
pub mod models;
pub mod ui;
pub mod utils;

pub use crate::core::{
    ArtifactBuildOrchestrator, BuildWorker, RequestingBuildsIndex, TaskGraphCoordinator,
    TaskRunner,
};
pub use error::{CompositeError, CompositeResult};
pub use models::{
    ArtifactRequest, BuildIdentifier, ComponentIdentifier, FileCollection, ResolutionResult,
    ResolvableDependencies, TaskState,
};
