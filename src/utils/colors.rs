// ============================================================================
// Compox - 颜色工具
// ============================================================================
//
// 文件: src/utils/colors.rs
// 职责: 终端颜色输出
// 边界:
//   - ✅ 终端颜色代码定义
//   - ✅ 颜色输出格式化
//   - ✅ 终端与配置检测（非终端或 --no-color 时不输出颜色）
//   - ❌ 不应包含业务逻辑
//   - ❌ 不应包含 UI 组件实现
//
// ============================================================================

use crate::models::config::Config;

/// ANSI 颜色代码
pub mod ansi {
    /// 重置颜色
    pub const RESET: &str = "\x1b[0m";

    /// 前景色
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// 日志级别颜色主题
pub mod log_colors {
    use super::ansi;

    /// 信息日志颜色 (青色)
    pub const INFO: &str = ansi::CYAN;

    /// 警告日志颜色 (黄色)
    pub const WARN: &str = ansi::YELLOW;

    /// 错误日志颜色 (红色)
    pub const ERROR: &str = ansi::RED;

    /// 成功日志颜色 (绿色)
    pub const SUCCESS: &str = ansi::GREEN;
}

/// 颜色工具函数
pub struct Colors;

impl Colors {
    /// 当前输出是否启用颜色
    pub fn enabled() -> bool {
        Config::get_colored() && atty::is(atty::Stream::Stdout)
    }

    /// 为文本添加颜色
    pub fn colorize(text: &str, color: &str) -> String {
        if Self::enabled() {
            format!("{}{}{}", color, text, ansi::RESET)
        } else {
            text.to_string()
        }
    }

    /// 信息颜色
    pub fn info(text: &str) -> String {
        Self::colorize(text, log_colors::INFO)
    }

    /// 警告颜色
    pub fn warn(text: &str) -> String {
        Self::colorize(text, log_colors::WARN)
    }

    /// 错误颜色
    pub fn error(text: &str) -> String {
        Self::colorize(text, log_colors::ERROR)
    }

    /// 成功颜色
    pub fn success(text: &str) -> String {
        Self::colorize(text, log_colors::SUCCESS)
    }

    /// 次要信息颜色
    pub fn dim(text: &str) -> String {
        Self::colorize(text, ansi::GRAY)
    }
}
