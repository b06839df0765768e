// ============================================================================
// Compox - 跨构建依赖图
// ============================================================================
//
// 文件: src/core/graph.rs
// 职责: 从解析结果推导构建之间的请求关系
// 边界:
//   - ✅ 请求构建索引 (RequestingBuildsIndex) 构建
//   - ✅ 构建级循环依赖诊断
//   - ❌ 不应包含任务登记逻辑
//   - ❌ 不应包含等待/阻塞逻辑
//
// 算法设计:
// 1. 遍历所有已解析的依赖边
// 2. 两端均为项目组件时，记录 selected 所属构建 <- from 所属构建
// 3. 使用 Tarjan 算法检测构建之间的强连通分量（仅用于诊断）
//
// ============================================================================

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{BuildIdentifier, DependencyResult};

/// 请求构建索引：目标构建 -> 依赖它的构建
///
/// 保留插入顺序，重复关系只记录一次。构建完成后不可变。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestingBuildsIndex {
    /// 按首次出现顺序排列的目标构建
    targets: Vec<BuildIdentifier>,
    /// 目标构建 -> 请求构建（按插入顺序）
    requesters: HashMap<BuildIdentifier, Vec<BuildIdentifier>>,
}

impl RequestingBuildsIndex {
    /// 从解析结果的依赖边构建索引
    pub fn from_dependencies<'a, I>(dependencies: I) -> Self
    where
        I: IntoIterator<Item = &'a DependencyResult>,
    {
        let mut index = Self::default();

        for dependency in dependencies {
            // 未解析的依赖不携带调度信息
            let DependencyResult::Resolved { from, selected } = dependency else {
                continue;
            };
            // 外部模块不参与调度
            if let (Some(from_build), Some(selected_build)) = (from.build(), selected.build()) {
                index.put(selected_build.clone(), from_build.clone());
            }
        }

        index
    }

    fn put(&mut self, target: BuildIdentifier, requester: BuildIdentifier) {
        let requesters = match self.requesters.get_mut(&target) {
            Some(requesters) => requesters,
            None => {
                self.targets.push(target.clone());
                self.requesters.entry(target).or_default()
            }
        };
        if !requesters.contains(&requester) {
            requesters.push(requester);
        }
    }

    /// 依赖目标构建的所有构建
    pub fn requesters(&self, target: &BuildIdentifier) -> &[BuildIdentifier] {
        self.requesters
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 依赖目标构建的所有构建；没有记录时回退到 fallback
    pub fn requesters_or(
        &self,
        target: &BuildIdentifier,
        fallback: &BuildIdentifier,
    ) -> Vec<BuildIdentifier> {
        match self.requesters(target) {
            [] => vec![fallback.clone()],
            requesters => requesters.to_vec(),
        }
    }

    /// 所有被依赖的构建（按首次出现顺序）
    pub fn targets(&self) -> &[BuildIdentifier] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// 检测构建之间的循环依赖（强连通分量中包含多个构建）
    pub fn build_cycles(&self) -> Vec<Vec<BuildIdentifier>> {
        let graph = self.to_graph();

        let mut cycles: Vec<Vec<BuildIdentifier>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut cycle: Vec<BuildIdentifier> =
                    scc.iter().map(|&node| graph[node].clone()).collect();
                cycle.sort();
                cycle
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// 构建依赖图：边方向为 请求构建 -> 目标构建
    fn to_graph(&self) -> DiGraph<BuildIdentifier, ()> {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<BuildIdentifier, NodeIndex> = HashMap::new();

        let mut node_for = |graph: &mut DiGraph<BuildIdentifier, ()>, build: &BuildIdentifier| {
            *node_map
                .entry(build.clone())
                .or_insert_with(|| graph.add_node(build.clone()))
        };

        for target in &self.targets {
            let target_node = node_for(&mut graph, target);
            for requester in self.requesters(target) {
                let requester_node = node_for(&mut graph, requester);
                graph.update_edge(requester_node, target_node, ());
            }
        }

        graph
    }

    /// 导出为可序列化的摘要
    pub fn summary(&self) -> Vec<RequestingBuilds> {
        self.targets
            .iter()
            .map(|target| RequestingBuilds {
                target: target.clone(),
                requesters: self.requesters(target).to_vec(),
            })
            .collect()
    }
}

/// 单个目标构建的请求关系（用于输出）
#[derive(Debug, Clone, Serialize)]
pub struct RequestingBuilds {
    pub target: BuildIdentifier,
    pub requesters: Vec<BuildIdentifier>,
}
