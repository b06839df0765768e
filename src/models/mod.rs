// ============================================================================
// Compox - 数据模型模块
// ============================================================================
//
// 文件: src/models/mod.rs
// 职责: 数据模型模块入口和导出
//
// ============================================================================

pub mod artifact;
pub mod build;
pub mod config;
pub mod plan;
pub mod task;

pub use artifact::{
    ArtifactCollection, ArtifactRequest, ComponentArtifactIdentifier, DependencyResult,
    FileCollection, ResolutionResult, ResolvableDependencies, ResolvedArtifactResult,
};
pub use build::{BuildIdentifier, ComponentIdentifier, ProjectComponentIdentifier};
pub use task::{TaskFailure, TaskKey, TaskOutput, TaskRequestRecord, TaskState};
