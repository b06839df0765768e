// ============================================================================
// Compox - 任务请求登记器
// ============================================================================
//
// 文件: src/core/registrar.rs
// 职责: 将跨构建制品请求转换为去重的任务请求记录
// 边界:
//   - ✅ 单个制品登记 (增量模式)
//   - ✅ 按请求构建索引批量登记 (批量模式)
//   - ✅ 提交记录到协调器
//   - ❌ 不会阻塞，也不会直接启动任务
//   - ❌ 不包含等待逻辑
//
// ============================================================================

use std::collections::HashSet;
use tracing::debug;

use crate::core::coordinator::TaskGraphCoordinator;
use crate::core::graph::RequestingBuildsIndex;
use crate::models::{ArtifactRequest, BuildIdentifier, TaskRequestRecord};

/// 任务请求登记器
///
/// 记录按首次登记顺序保存，重复记录只保留一份。
#[derive(Debug, Default)]
pub struct TaskRequestRegistrar {
    records: Vec<TaskRequestRecord>,
    seen: HashSet<TaskRequestRecord>,
}

impl TaskRequestRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记 requesting 构建对一个制品的请求，返回新增的记录数
    pub fn register(&mut self, requesting: &BuildIdentifier, artifact: &ArtifactRequest) -> usize {
        if !artifact.is_schedulable() {
            debug!(component = %artifact.component, "artifact has no producing tasks, skipped");
            return 0;
        }

        let mut added = 0;
        for task in &artifact.tasks {
            let record = TaskRequestRecord::new(requesting.clone(), artifact.build().clone(), task);
            if self.seen.insert(record.clone()) {
                self.records.push(record);
                added += 1;
            }
        }
        added
    }

    /// 批量登记：每个制品按其所属构建的所有请求构建各登记一次
    ///
    /// 没有记录请求构建的目标构建由 initiating 构建代为请求。
    pub fn register_all<'a, I>(
        &mut self,
        index: &RequestingBuildsIndex,
        artifacts: I,
        initiating: &BuildIdentifier,
    ) -> usize
    where
        I: IntoIterator<Item = &'a ArtifactRequest>,
    {
        let mut added = 0;
        for artifact in artifacts {
            for requesting in index.requesters_or(artifact.build(), initiating) {
                added += self.register(&requesting, artifact);
            }
        }
        added
    }

    /// 已登记但尚未提交的记录
    pub fn records(&self) -> &[TaskRequestRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 取出全部记录并清空登记器
    pub fn drain(&mut self) -> Vec<TaskRequestRecord> {
        self.seen.clear();
        std::mem::take(&mut self.records)
    }

    /// 将全部记录登记到协调器，记录保留在登记器中
    ///
    /// 协调器对重复登记幂等，可以多次调用。
    pub fn publish(&self, coordinator: &TaskGraphCoordinator) -> &[TaskRequestRecord] {
        for record in &self.records {
            coordinator.add_task(&record.requesting_build, &record.target_build, &record.task);
        }
        &self.records
    }

    /// 将全部记录提交给协调器并清空登记器，返回已提交的记录
    pub fn submit(&mut self, coordinator: &TaskGraphCoordinator) -> Vec<TaskRequestRecord> {
        self.publish(coordinator);
        self.drain()
    }
}
