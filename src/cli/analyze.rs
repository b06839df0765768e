// ============================================================================
// Compox - CLI Analyze 命令
// ============================================================================
//
// 文件: src/cli/analyze.rs
// 职责: 跨构建依赖分析命令的 CLI 接口层
// 边界:
//   - ✅ 命令行参数定义和解析
//   - ✅ 调用依赖图构建器执行分析
//   - ✅ 结果格式化输出（表格/JSON）
//   - ❌ 不应包含依赖图算法逻辑
//   - ❌ 不应执行任何任务
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::core::graph::{RequestingBuilds, RequestingBuildsIndex};
use crate::models::config::Config;
use crate::models::plan::{CompositePlan, ResolutionDefinition};
use crate::models::{BuildIdentifier, ResolvableDependencies};
use crate::ui::summary::print_build_cycles_table;
use crate::utils::constants::{icons, RULE_HEAVY, RULE_LIGHT};
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 分析组合构建的跨构建依赖
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// 组合构建计划文件
    #[arg(short = 'p', long, default_value = "composite.toml")]
    pub plan: PathBuf,

    /// 输出格式 (table, json)
    #[arg(short = 'f', long, default_value = "table")]
    pub format: String,
}

/// 单个解析结果的分析
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionAnalysis {
    pub resolution: String,
    pub build: BuildIdentifier,
    /// 由其他构建产出的制品需要执行的任务（构建:任务）
    pub cross_build_tasks: Vec<String>,
    pub requesting_builds: Vec<RequestingBuilds>,
    pub build_cycles: Vec<Vec<BuildIdentifier>>,
}

impl ResolutionAnalysis {
    pub fn from_definition(definition: &ResolutionDefinition) -> Self {
        let result = definition.to_result();
        let index = RequestingBuildsIndex::from_dependencies(result.all_dependencies());

        let mut cross_build_tasks = Vec::new();
        for artifact in result.artifacts().artifacts() {
            if let Some(request) = artifact.id.cross_build_request(&definition.build) {
                for task in &request.tasks {
                    let key = format!("{}:{}", request.build(), task);
                    if !cross_build_tasks.contains(&key) {
                        cross_build_tasks.push(key);
                    }
                }
            }
        }

        Self {
            resolution: definition.name.clone(),
            build: definition.build.clone(),
            cross_build_tasks,
            requesting_builds: index.summary(),
            build_cycles: index.build_cycles(),
        }
    }
}

pub fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let plan = CompositePlan::load(&args.plan)?;
    let analyses: Vec<ResolutionAnalysis> = plan
        .resolutions
        .iter()
        .map(ResolutionAnalysis::from_definition)
        .collect();

    match args.format.as_str() {
        "json" => {
            let json_output = serde_json::to_string_pretty(&analyses)?;
            println!("{}", json_output);
        }
        "table" => print_table_format(&plan, &analyses, Config::get_verbose()),
        other => anyhow::bail!(tf!("analyze.unknown_format", other)),
    }

    Ok(())
}

fn print_table_format(plan: &CompositePlan, analyses: &[ResolutionAnalysis], verbose: bool) {
    Logger::info(format!("\n{} {}", icons::ANALYZE, t!("analyze.title")));
    Logger::info(RULE_HEAVY);
    Logger::info(format!("{} {}", icons::BUILD, tf!("analyze.root_build", &plan.root)));
    Logger::info(format!("{} {}", icons::BUILD, tf!("analyze.total_builds", plan.builds.len())));
    Logger::info(format!(
        "{} {}",
        icons::DEPENDENCY,
        tf!("analyze.total_resolutions", analyses.len())
    ));

    for analysis in analyses {
        Logger::info("");
        Logger::info(tf!("analyze.resolution_header", &analysis.resolution, &analysis.build));
        Logger::info(RULE_LIGHT);

        if analysis.cross_build_tasks.is_empty() {
            Logger::info(format!("  {} {}", icons::SKIP, t!("analyze.no_cross_build")));
            continue;
        }

        for task in &analysis.cross_build_tasks {
            Logger::info(format!("  {} {}", icons::TASK, task));
        }

        if verbose {
            for entry in &analysis.requesting_builds {
                let requesters: Vec<&str> =
                    entry.requesters.iter().map(BuildIdentifier::name).collect();
                Logger::info(format!(
                    "    {} {} {} {}",
                    icons::DEPENDENCY,
                    requesters.join(", "),
                    icons::ARROW,
                    entry.target
                ));
            }
        }

        if !analysis.build_cycles.is_empty() {
            print_build_cycles_table(&analysis.build_cycles);
        }
    }

    Logger::info("");
    Logger::info(format!("{} {}", icons::INFO, t!("analyze.usage_tip")));
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
root = "app"

[[builds]]
name = "app"
[[builds]]
name = "lib"
[[builds]]
name = "util"

[[resolutions]]
name = "app-runtime"
build = "app"
[[resolutions.edges]]
from = "app::"
selected = "lib::core"
[[resolutions.edges]]
from = "lib::core"
selected = "util::"
[[resolutions.artifacts]]
component = "lib::core"
file = "lib/core.jar"
tasks = ["jar", "classes"]
[[resolutions.artifacts]]
component = "app::"
file = "app/app.jar"
tasks = ["jar"]
[[resolutions.artifacts]]
component = "util::"
file = "util/util.jar"
tasks = ["jar"]
"#;

    #[test]
    fn lists_cross_build_tasks_only() {
        let plan = CompositePlan::parse(PLAN).unwrap();
        let analysis = ResolutionAnalysis::from_definition(&plan.resolutions[0]);

        assert_eq!(
            analysis.cross_build_tasks,
            vec!["lib:classes", "lib:jar", "util:jar"]
        );
        assert_eq!(analysis.requesting_builds.len(), 2);
        assert!(analysis.build_cycles.is_empty());
    }

    #[test]
    fn analysis_serializes_to_json() {
        let plan = CompositePlan::parse(PLAN).unwrap();
        let analysis = ResolutionAnalysis::from_definition(&plan.resolutions[0]);
        let json = serde_json::to_value(&analysis).unwrap();

        assert_eq!(json["build"], "app");
        assert_eq!(json["requesting_builds"][0]["target"], "lib");
        assert_eq!(json["requesting_builds"][0]["requesters"][0], "app");
    }
}
