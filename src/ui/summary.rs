// ============================================================================
// Compox - 执行结果汇总组件
// ============================================================================
//
// 文件: src/ui/summary.rs
// 职责: 执行结果汇总显示
// 边界:
//   - ✅ 执行结果汇总显示
//   - ✅ 统计信息格式化输出
//   - ✅ 构建循环依赖表格显示
//   - ❌ 不应包含具体业务逻辑
//   - ❌ 不应包含任务执行逻辑
//
// ============================================================================

use std::io::{self, Write};
use std::time::Duration;

use crate::core::coordinator::CoordinatorSummary;
use crate::core::worker::WorkerReport;
use crate::models::BuildIdentifier;
use crate::utils::colors::Colors;
use crate::utils::constants::{icons, RULE_HEAVY, RULE_LIGHT};
use crate::utils::logger::Logger;
use crate::utils::styles::TextStyles;
use crate::{t, tf};

// ============================================================================
// 执行汇总显示
// ============================================================================

/// 渲染执行汇总
pub fn render_execution_summary(
    reports: &[WorkerReport],
    summary: &CoordinatorSummary,
    duration: Duration,
) {
    let executed: usize = reports.iter().map(|report| report.tasks.len()).sum();

    let summary_lines = vec![
        "".to_string(),
        TextStyles::bold(&t!("summary.title")),
        RULE_HEAVY.to_string(),
        format!("{} {}", icons::TASK, tf!("summary.requested_tasks", summary.requested)),
        format!("{} {}", icons::BUILD, tf!("summary.executed_tasks", executed)),
        format!("{} {}", icons::SUCCESS, tf!("summary.completed_tasks", summary.completed)),
        format!("{} {}", icons::ERROR, tf!("summary.failed_tasks", summary.failed)),
        format!(
            "{} {}",
            icons::SKIP,
            tf!("summary.pending_tasks", summary.pending + summary.running)
        ),
        format!(
            "{} {}",
            icons::TIME,
            tf!("summary.duration", format!("{:.2}", duration.as_secs_f64()))
        ),
    ];

    for line in summary_lines {
        Logger::info(line);
    }

    // 失败任务详情
    let failures: Vec<_> = reports
        .iter()
        .flat_map(|report| report.tasks.iter())
        .filter_map(|task| task.result.as_ref().err().map(|failure| (task, failure)))
        .collect();
    if !failures.is_empty() {
        Logger::info("");
        Logger::info(t!("summary.failures"));
        Logger::info(RULE_LIGHT);
        for (task, failure) in failures {
            Logger::error(format!(
                "{} {}:{} {}",
                icons::ERROR,
                task.build,
                task.task,
                Colors::dim(&failure.message)
            ));
        }
    }

    let _ = io::stdout().flush();
}

// ============================================================================
// 构建循环依赖显示
// ============================================================================

/// 打印构建循环依赖表格
pub fn print_build_cycles_table(cycles: &[Vec<BuildIdentifier>]) {
    Logger::info("");
    Logger::info(t!("analyze.cycles.details"));
    Logger::info(RULE_LIGHT);

    for (index, cycle) in cycles.iter().enumerate() {
        let names: Vec<&str> = cycle.iter().map(BuildIdentifier::name).collect();
        Logger::warn(tf!(
            "analyze.cycles.cycle",
            index + 1,
            names.join(&format!(" {} ", icons::ARROW))
        ));
    }

    Logger::info(t!("analyze.cycles.suggestion"));
}
