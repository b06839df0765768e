// ============================================================================
// Compox - Core 核心模块
// ============================================================================
//
// 文件: src/core/mod.rs
// 职责: 跨构建调度核心逻辑模块入口和导出
// 边界:
//   - ✅ 核心子模块导出
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含具体业务实现
//   - ❌ 不应包含 CLI 相关逻辑
//   - ❌ 不应包含 UI 相关逻辑
//
// ============================================================================

pub mod coordinator;
pub mod graph;
pub mod orchestrator;
pub mod registrar;
pub mod runner;
pub mod worker;

// 重新导出常用类型
pub use coordinator::{BuildTaskQueue, CoordinatorConfig, CoordinatorSummary, TaskGraphCoordinator};
pub use graph::RequestingBuildsIndex;
pub use orchestrator::{ArtifactBuildOrchestrator, IncrementalArtifactBuilder};
pub use registrar::TaskRequestRegistrar;
pub use runner::CommandTaskRunner;
pub use worker::{BuildWorker, TaskReport, TaskRunner, WorkerConfig, WorkerReport};
