// ============================================================================
// Compox - 构建标识数据模型
// ============================================================================
//
// 文件: src/models/build.rs
// 职责: 构建单元与组件标识的数据结构定义
// 边界:
//   - ✅ 构建标识 (BuildIdentifier) 定义
//   - ✅ 组件标识 (项目组件 / 外部模块) 定义
//   - ✅ 组件标识字符串解析
//   - ❌ 不应包含依赖图构建逻辑
//   - ❌ 不应包含任务调度逻辑
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 构建单元标识（根构建或被包含的构建）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BuildIdentifier(Arc<str>);

impl BuildIdentifier {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// 构建名称
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<String> for BuildIdentifier {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&str> for BuildIdentifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<BuildIdentifier> for String {
    fn from(build: BuildIdentifier) -> Self {
        build.0.to_string()
    }
}

impl fmt::Display for BuildIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 构建内的项目组件标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectComponentIdentifier {
    /// 所属构建
    pub build: BuildIdentifier,
    /// 项目路径（根项目为空字符串）
    pub project_path: String,
}

impl ProjectComponentIdentifier {
    pub fn new(build: impl Into<BuildIdentifier>, project_path: impl Into<String>) -> Self {
        Self {
            build: build.into(),
            project_path: project_path.into(),
        }
    }

    /// 所属构建
    pub fn build(&self) -> &BuildIdentifier {
        &self.build
    }
}

impl fmt::Display for ProjectComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.build, self.project_path)
    }
}

/// 组件标识：项目组件参与调度，外部模块不参与
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentIdentifier {
    /// 某个构建内的项目
    Project(ProjectComponentIdentifier),
    /// 外部模块 (group:name:version)
    Module {
        group: String,
        name: String,
        version: String,
    },
}

impl ComponentIdentifier {
    pub fn project(build: impl Into<BuildIdentifier>, project_path: impl Into<String>) -> Self {
        Self::Project(ProjectComponentIdentifier::new(build, project_path))
    }

    pub fn module(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::Module {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// 如果是项目组件，返回项目标识
    pub fn as_project(&self) -> Option<&ProjectComponentIdentifier> {
        match self {
            ComponentIdentifier::Project(project) => Some(project),
            ComponentIdentifier::Module { .. } => None,
        }
    }

    /// 所属构建（外部模块没有所属构建）
    pub fn build(&self) -> Option<&BuildIdentifier> {
        self.as_project().map(ProjectComponentIdentifier::build)
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentIdentifier::Project(project) => write!(f, "{}", project),
            ComponentIdentifier::Module {
                group,
                name,
                version,
            } => write!(f, "{}:{}:{}", group, name, version),
        }
    }
}

/// 组件标识解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid component identifier '{0}': expected 'build::path' or 'group:name:version'")]
pub struct ParseComponentError(pub String);

impl FromStr for ComponentIdentifier {
    type Err = ParseComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 项目组件: "<build>::<project path>"
        if let Some((build, path)) = s.split_once("::") {
            if build.is_empty() {
                return Err(ParseComponentError(s.to_string()));
            }
            return Ok(ComponentIdentifier::project(build, path));
        }

        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, name, version] if parts.iter().all(|p| !p.is_empty()) => {
                Ok(ComponentIdentifier::module(*group, *name, *version))
            }
            _ => Err(ParseComponentError(s.to_string())),
        }
    }
}

impl TryFrom<String> for ComponentIdentifier {
    type Error = ParseComponentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentIdentifier> for String {
    fn from(component: ComponentIdentifier) -> Self {
        component.to_string()
    }
}
