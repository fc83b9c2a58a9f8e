// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 捕获任务
///
/// 请求对一个发布者域名进行整站发现与捕获的工作单元。
/// 由外部生产者（CLI 或 API）放入捕获队列，被一个
/// 工作器实例消费一次，消费后不再变更。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureJob {
    /// 发布者ID
    pub publisher_id: Uuid,
    /// 扫描任务ID
    pub scan_job_id: Uuid,
    /// 捕获页面数量上限（缺省表示不限制，仅受发现结果约束）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u64>,
}

/// 评估任务
///
/// 每个成功持久化的内容条目对应一条，发往评估队列。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationJob {
    /// 内容条目ID
    pub content_item_id: Uuid,
}
