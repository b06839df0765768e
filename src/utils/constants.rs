// ============================================================================
// Compox - 常量定义
// ============================================================================
//
// 文件: src/utils/constants.rs
// 职责: 应用程序常量定义
// 边界:
//   - ✅ 应用程序常量定义
//   - ✅ 像素图标字符定义
//   - ❌ 不应包含动态配置
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

/// 应用名称常量
pub const APP_NAME: &str = "COMPOX";

/// 分隔线
pub const RULE_HEAVY: &str = "═══════════════════════════════════════";
pub const RULE_LIGHT: &str = "───────────────────────────────────────";

/// 像素风格图标
pub mod icons {
    /// 构建图标
    pub const BUILD: &str = "▓";
    /// 成功图标
    pub const SUCCESS: &str = "✓";
    /// 错误图标
    pub const ERROR: &str = "✗";
    /// 警告图标
    pub const WARNING: &str = "!";
    /// 信息图标
    pub const INFO: &str = "i";
    /// 任务图标
    pub const TASK: &str = "●";
    /// 分析图标
    pub const ANALYZE: &str = "◇";
    /// 依赖图标
    pub const DEPENDENCY: &str = "◦";
    /// 制品图标
    pub const ARTIFACT: &str = "◉";
    /// 时间图标
    pub const TIME: &str = "⧖";
    /// 箭头图标
    pub const ARROW: &str = "→";
    /// 跳过图标
    pub const SKIP: &str = "○";
}
