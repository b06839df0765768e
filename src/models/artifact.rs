// ============================================================================
// Compox - 制品与解析结果数据模型
// ============================================================================
//
// 文件: src/models/artifact.rs
// 职责: 依赖解析引擎输出的数据结构定义
// 边界:
//   - ✅ 制品请求 (ArtifactRequest) 定义
//   - ✅ 解析后的依赖边与制品集合定义
//   - ✅ 可解析依赖 (ResolvableDependencies) 接口定义
//   - ❌ 不应包含依赖解析算法
//   - ❌ 不应包含任务调度逻辑
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::models::build::{BuildIdentifier, ComponentIdentifier, ProjectComponentIdentifier};

/// 制品请求：目标项目组件 + 产出该制品的任务集合
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRequest {
    /// 产出制品的项目组件
    pub component: ProjectComponentIdentifier,
    /// 任务名称（去重，无序）
    pub tasks: BTreeSet<String>,
}

impl ArtifactRequest {
    pub fn new<I, S>(component: ProjectComponentIdentifier, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            component,
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }

    /// 制品所属的构建
    pub fn build(&self) -> &BuildIdentifier {
        &self.component.build
    }

    /// 没有任务的项目制品无法调度
    pub fn is_schedulable(&self) -> bool {
        !self.tasks.is_empty()
    }
}

/// 组件制品标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentArtifactIdentifier {
    /// 由某个构建的任务产出的项目制品
    Project(ArtifactRequest),
    /// 外部模块制品（已存在于本地，无需调度）
    External {
        component: ComponentIdentifier,
        name: String,
    },
}

impl ComponentArtifactIdentifier {
    /// 如果制品由其他构建产出，返回对应的制品请求
    pub fn cross_build_request(&self, current_build: &BuildIdentifier) -> Option<&ArtifactRequest> {
        match self {
            ComponentArtifactIdentifier::Project(request) if request.build() != current_build => {
                Some(request)
            }
            _ => None,
        }
    }
}

/// 单个已解析制品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifactResult {
    pub id: ComponentArtifactIdentifier,
    pub file: PathBuf,
}

/// 文件集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCollection(Vec<PathBuf>);

impl FileCollection {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self(files)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for FileCollection {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// 已解析的制品集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactCollection {
    artifacts: Vec<ResolvedArtifactResult>,
}

impl ArtifactCollection {
    pub fn new(artifacts: Vec<ResolvedArtifactResult>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &[ResolvedArtifactResult] {
        &self.artifacts
    }

    /// 制品文件集合（顺序与制品顺序一致）
    pub fn artifact_files(&self) -> FileCollection {
        FileCollection::new(self.artifacts.iter().map(|a| a.file.clone()).collect())
    }
}

/// 依赖解析结果中的一条边
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyResult {
    /// 已解析：from 依赖 selected
    Resolved {
        from: ComponentIdentifier,
        selected: ComponentIdentifier,
    },
    /// 未能解析的依赖
    Unresolved {
        from: ComponentIdentifier,
        requested: String,
    },
}

impl DependencyResult {
    pub fn resolved(from: ComponentIdentifier, selected: ComponentIdentifier) -> Self {
        Self::Resolved { from, selected }
    }
}

/// 依赖解析引擎提供的接口
pub trait ResolvableDependencies {
    /// 解析结果中的所有依赖边（惰性迭代）
    fn all_dependencies(&self) -> impl Iterator<Item = &DependencyResult> + '_;

    /// 解析出的制品集合
    fn artifacts(&self) -> &ArtifactCollection;
}

/// 一次依赖解析的具体结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    pub dependencies: Vec<DependencyResult>,
    pub artifacts: ArtifactCollection,
}

impl ResolutionResult {
    pub fn new(dependencies: Vec<DependencyResult>, artifacts: Vec<ResolvedArtifactResult>) -> Self {
        Self {
            dependencies,
            artifacts: ArtifactCollection::new(artifacts),
        }
    }
}

impl ResolvableDependencies for ResolutionResult {
    fn all_dependencies(&self) -> impl Iterator<Item = &DependencyResult> + '_ {
        self.dependencies.iter()
    }

    fn artifacts(&self) -> &ArtifactCollection {
        &self.artifacts
    }
}
