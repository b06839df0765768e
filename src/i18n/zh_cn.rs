// ============================================================================
// Compox - 中文翻译表
// ============================================================================
//
// 文件: src/i18n/zh_cn.rs
// 职责: 中文翻译内容定义
// 边界:
//   - ✅ 中文翻译字符串定义
//   - ❌ 不应包含翻译逻辑
//   - ❌ 不应包含其他语言翻译
//
// ============================================================================

/// 中文翻译表
pub const TRANSLATIONS: &[(&str, &str)] = &[
    // 分析命令
    ("analyze.title", "跨构建依赖分析"),
    ("analyze.root_build", "根构建: {}"),
    ("analyze.total_builds", "构建数量: {}"),
    ("analyze.total_resolutions", "解析数量: {}"),
    ("analyze.resolution_header", "解析 '{}' (构建 {})"),
    ("analyze.no_cross_build", "没有来自其他构建的制品"),
    ("analyze.unknown_format", "未知的输出格式 '{}'，请使用 'table' 或 'json'"),
    ("analyze.usage_tip", "使用 'compox run -p <计划文件>' 构建上面列出的制品"),
    ("analyze.cycles.details", "相互依赖的构建:"),
    ("analyze.cycles.cycle", "{}. {}"),
    ("analyze.cycles.suggestion", "构建之间相互等待的任务将以循环依赖错误失败"),
    // 计划错误
    ("error.read_plan", "读取组合构建计划失败: {}"),
    ("error.parse_plan", "解析组合构建计划失败: {}"),
    ("error.duplicate_build", "构建 '{}' 被重复定义"),
    ("error.unknown_build", "未知的构建 '{}'"),
    ("error.unknown_resolution", "任务 '{}' 引用了未知的解析 '{}'"),
    ("error.foreign_resolution", "任务 '{}' 引用的解析 '{}' 属于构建 '{}'"),
    // 运行命令
    ("run.start", "运行组合构建 '{}' (共 {} 个构建)"),
    ("run.no_resolutions", "构建 '{}' 没有需要执行的解析"),
    ("run.resolution_not_found", "未找到解析 '{}'"),
    ("run.resolution_done", "解析 '{}' 完成 ({} 个文件)"),
    ("run.resolution_cancelled", "解析 '{}' 已取消"),
    ("run.resolution_failed", "解析 '{}' 失败: {}"),
    ("run.files", "解析得到的文件:"),
    ("run.success", "组合构建完成"),
    ("run.failed", "组合构建失败"),
    // 命令执行
    ("runner.command_run", "[{}] $ {}"),
    ("runner.command_stdout", "{}"),
    ("runner.command_stderr", "{}"),
    ("runner.command_spawn_failed", "无法启动 '{}': {}"),
    ("runner.command_failed", "'{}' 退出码 {}"),
    ("runner.unknown_task", "计划中未定义任务 '{}'"),
    ("runner.unknown_resolution", "计划中未定义解析 '{}'"),
    ("runner.resolution_failed", "解析 '{}' 失败: {}"),
    ("runner.foreign_resolution", "解析 '{}' 属于构建 '{}'，不能由 '{}' 解析"),
    // 构建执行引擎
    ("worker.task_start", "开始执行 {}:{}"),
    ("worker.task_success", "完成 {}:{}，耗时 {}s"),
    ("worker.task_failed", "{}:{} 执行失败，耗时 {}s: {}"),
    ("worker.task_timeout", "任务执行超时 ({}s)"),
    ("worker.task_join_error", "构建 '{}' 的任务异常退出: {}"),
    ("worker.join_error", "构建执行引擎异常退出: {}"),
    // 执行汇总
    ("summary.title", "执行汇总"),
    ("summary.requested_tasks", "请求任务: {}"),
    ("summary.executed_tasks", "执行任务: {}"),
    ("summary.completed_tasks", "成功: {}"),
    ("summary.failed_tasks", "失败: {}"),
    ("summary.pending_tasks", "未完成: {}"),
    ("summary.duration", "耗时: {}s"),
    ("summary.failures", "失败任务:"),
];
