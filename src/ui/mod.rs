// ============================================================================
// Compox - UI 模块
// ============================================================================
//
// 文件: src/ui/mod.rs
// 职责: 终端展示组件入口
//
// ============================================================================

pub mod summary;
