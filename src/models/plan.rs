// ============================================================================
// Compox - 组合构建计划数据模型
// ============================================================================
//
// 文件: src/models/plan.rs
// 职责: 组合构建计划文件 (TOML) 的数据结构定义和加载
// 边界:
//   - ✅ 构建、任务、解析结果定义
//   - ✅ 计划文件加载与校验
//   - ✅ 转换为解析引擎数据结构
//   - ❌ 不应包含任务执行逻辑
//   - ❌ 不应包含调度逻辑
//
// ============================================================================

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::models::artifact::{
    ArtifactRequest, ComponentArtifactIdentifier, DependencyResult, ResolutionResult,
    ResolvedArtifactResult,
};
use crate::models::build::{BuildIdentifier, ComponentIdentifier};
use crate::tf;

/// 组合构建计划
#[derive(Debug, Clone, Deserialize)]
pub struct CompositePlan {
    /// 根构建
    pub root: BuildIdentifier,
    /// 参与组合的所有构建
    #[serde(default)]
    pub builds: Vec<BuildDefinition>,
    /// 各构建的依赖解析结果
    #[serde(default)]
    pub resolutions: Vec<ResolutionDefinition>,
}

/// 构建定义
#[derive(Debug, Clone, Deserialize)]
pub struct BuildDefinition {
    pub name: BuildIdentifier,
    /// 构建目录（相对于计划文件）
    #[serde(default = "default_build_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskDefinition>,
}

/// 任务定义
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDefinition {
    /// 执行的 shell 命令（为空时任务直接成功）
    #[serde(default)]
    pub command: Option<String>,
    /// 执行前需要先完成的解析结果名称
    #[serde(default)]
    pub resolves: Option<String>,
}

/// 一次依赖解析的结果定义
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionDefinition {
    pub name: String,
    /// 发起解析的构建
    pub build: BuildIdentifier,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDefinition>,
}

/// 依赖边定义（没有 selected 表示未解析）
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeDefinition {
    pub from: ComponentIdentifier,
    #[serde(default)]
    pub selected: Option<ComponentIdentifier>,
    #[serde(default)]
    pub requested: Option<String>,
}

/// 制品定义
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactDefinition {
    pub component: ComponentIdentifier,
    pub file: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    /// 产出制品的任务（仅项目组件有效）
    #[serde(default)]
    pub tasks: Vec<String>,
}

fn default_build_dir() -> PathBuf {
    PathBuf::from(".")
}

impl CompositePlan {
    /// 从文件加载计划并校验
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| tf!("error.read_plan", path.display()))?;
        let plan = Self::parse(&content)
            .with_context(|| tf!("error.parse_plan", path.display()))?;
        Ok(plan)
    }

    /// 解析计划内容并校验
    pub fn parse(content: &str) -> Result<Self> {
        let plan: CompositePlan = toml::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    /// 校验构建与解析结果之间的引用
    fn validate(&self) -> Result<()> {
        let mut builds = HashSet::new();
        for build in &self.builds {
            if !builds.insert(&build.name) {
                anyhow::bail!(tf!("error.duplicate_build", &build.name));
            }
        }

        if !builds.contains(&self.root) {
            anyhow::bail!(tf!("error.unknown_build", &self.root));
        }

        let resolution_builds: HashMap<&str, &BuildIdentifier> = self
            .resolutions
            .iter()
            .map(|r| (r.name.as_str(), &r.build))
            .collect();

        // 任务只能解析自己所属构建的依赖
        for build in &self.builds {
            for (task_name, task) in &build.tasks {
                let Some(resolution) = &task.resolves else {
                    continue;
                };
                let task_id = format!("{}:{}", build.name, task_name);
                match resolution_builds.get(resolution.as_str()) {
                    None => anyhow::bail!(tf!("error.unknown_resolution", task_id, resolution)),
                    Some(owner) if **owner != build.name => anyhow::bail!(tf!(
                        "error.foreign_resolution",
                        task_id,
                        resolution,
                        owner
                    )),
                    Some(_) => {}
                }
            }
        }

        for resolution in &self.resolutions {
            if !builds.contains(&resolution.build) {
                anyhow::bail!(tf!("error.unknown_build", &resolution.build));
            }
            let components = resolution
                .edges
                .iter()
                .flat_map(|e| std::iter::once(&e.from).chain(e.selected.iter()))
                .chain(resolution.artifacts.iter().map(|a| &a.component));
            for component in components {
                if let Some(build) = component.build() {
                    if !builds.contains(build) {
                        anyhow::bail!(tf!("error.unknown_build", build));
                    }
                }
            }
        }

        Ok(())
    }

    /// 查找构建定义
    pub fn build(&self, name: &BuildIdentifier) -> Option<&BuildDefinition> {
        self.builds.iter().find(|b| &b.name == name)
    }

    /// 按名称查找解析结果
    pub fn resolution(&self, name: &str) -> Option<&ResolutionDefinition> {
        self.resolutions.iter().find(|r| r.name == name)
    }

    /// 由某个构建发起的所有解析结果
    pub fn resolutions_for<'a>(
        &'a self,
        build: &'a BuildIdentifier,
    ) -> impl Iterator<Item = &'a ResolutionDefinition> + 'a {
        self.resolutions.iter().filter(move |r| &r.build == build)
    }

    /// 查找任务定义
    pub fn task(&self, build: &BuildIdentifier, task: &str) -> Option<&TaskDefinition> {
        self.build(build).and_then(|b| b.tasks.get(task))
    }
}

impl ResolutionDefinition {
    /// 转换为解析引擎的结果结构
    pub fn to_result(&self) -> ResolutionResult {
        let dependencies = self
            .edges
            .iter()
            .map(|edge| match &edge.selected {
                Some(selected) => DependencyResult::resolved(edge.from.clone(), selected.clone()),
                None => DependencyResult::Unresolved {
                    from: edge.from.clone(),
                    requested: edge.requested.clone().unwrap_or_default(),
                },
            })
            .collect();

        let artifacts = self
            .artifacts
            .iter()
            .map(|artifact| {
                let id = match &artifact.component {
                    ComponentIdentifier::Project(project) => ComponentArtifactIdentifier::Project(
                        ArtifactRequest::new(project.clone(), artifact.tasks.iter().cloned()),
                    ),
                    external => ComponentArtifactIdentifier::External {
                        component: external.clone(),
                        name: artifact.name.clone().unwrap_or_else(|| {
                            artifact
                                .file
                                .file_name()
                                .map(|n| n.to_string_lossy().to_string())
                                .unwrap_or_default()
                        }),
                    },
                };
                ResolvedArtifactResult {
                    id,
                    file: artifact.file.clone(),
                }
            })
            .collect();

        ResolutionResult::new(dependencies, artifacts)
    }
}
