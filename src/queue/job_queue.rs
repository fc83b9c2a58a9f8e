// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::capture_job::{CaptureJob, EvaluationJob};
use crate::infrastructure::cache::redis_client::RedisClient;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// 捕获队列名
pub const CAPTURE_QUEUE: &str = "capture";

/// 评估队列名
pub const EVALUATE_QUEUE: &str = "evaluate";

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// Redis错误
    #[error("redis error: {0}")]
    Backend(String),

    /// 负载无法解析
    #[error("invalid job payload: {0}")]
    InvalidPayload(String),
}

/// 已认领的捕获任务
///
/// 保留原始负载字符串用于确认（LREM）或退回。
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    /// 解析后的任务
    pub job: CaptureJob,
    raw: String,
}

/// 任务队列特质
///
/// 入站捕获任务与出站评估任务的收发接口。
/// 语义为至少一次投递：认领是原子的，确认前崩溃的任务
/// 停留在 processing 列表中等待对账。
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 将捕获任务放入捕获队列
    async fn enqueue_capture(&self, job: &CaptureJob) -> Result<(), QueueError>;

    /// 原子认领一个捕获任务
    async fn claim_capture(&self) -> Result<Option<ClaimedJob>, QueueError>;

    /// 确认已完成的任务
    async fn ack(&self, claimed: &ClaimedJob) -> Result<(), QueueError>;

    /// 将失败的任务退回队列等待重投
    async fn fail(&self, claimed: &ClaimedJob) -> Result<(), QueueError>;

    /// 为成功持久化的内容条目发出一个评估任务
    async fn enqueue_evaluation(&self, job: &EvaluationJob) -> Result<(), QueueError>;
}

/// Redis任务队列实现
///
/// 可靠队列模式：生产者 LPUSH 到 `{queue}:pending`；
/// 认领用 RPOPLPUSH 移入 `{queue}:processing`；
/// 确认用 LREM 从 processing 移除；失败则推回 pending。
pub struct RedisJobQueue {
    redis: RedisClient,
}

impl RedisJobQueue {
    /// 创建新的Redis任务队列实例
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    fn pending_key(queue: &str) -> String {
        format!("queue:{}:pending", queue)
    }

    fn processing_key(queue: &str) -> String {
        format!("queue:{}:processing", queue)
    }

    /// 捕获队列当前的待处理积压长度
    pub async fn pending_capture_len(&self) -> Result<i64, QueueError> {
        self.redis
            .llen(&Self::pending_key(CAPTURE_QUEUE))
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue_capture(&self, job: &CaptureJob) -> Result<(), QueueError> {
        let payload =
            serde_json::to_string(job).map_err(|e| QueueError::InvalidPayload(e.to_string()))?;
        self.redis
            .lpush(&Self::pending_key(CAPTURE_QUEUE), &payload)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))
    }

    async fn claim_capture(&self) -> Result<Option<ClaimedJob>, QueueError> {
        let raw = self
            .redis
            .rpoplpush(
                &Self::pending_key(CAPTURE_QUEUE),
                &Self::processing_key(CAPTURE_QUEUE),
            )
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;

        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match serde_json::from_str::<CaptureJob>(&raw) {
            Ok(job) => Ok(Some(ClaimedJob { job, raw })),
            Err(e) => {
                // 无法解析的负载会无限重投，直接从 processing 清除
                error!(error = %e, payload = %raw, "dropping malformed capture job payload");
                let _ = self
                    .redis
                    .lrem(&Self::processing_key(CAPTURE_QUEUE), 1, &raw)
                    .await;
                Err(QueueError::InvalidPayload(e.to_string()))
            }
        }
    }

    async fn ack(&self, claimed: &ClaimedJob) -> Result<(), QueueError> {
        self.redis
            .lrem(&Self::processing_key(CAPTURE_QUEUE), 1, &claimed.raw)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn fail(&self, claimed: &ClaimedJob) -> Result<(), QueueError> {
        self.redis
            .lrem(&Self::processing_key(CAPTURE_QUEUE), 1, &claimed.raw)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        self.redis
            .lpush(&Self::pending_key(CAPTURE_QUEUE), &claimed.raw)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))
    }

    async fn enqueue_evaluation(&self, job: &EvaluationJob) -> Result<(), QueueError> {
        let payload =
            serde_json::to_string(job).map_err(|e| QueueError::InvalidPayload(e.to_string()))?;
        self.redis
            .lpush(&Self::pending_key(EVALUATE_QUEUE), &payload)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))
    }
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn enqueue_capture(&self, job: &CaptureJob) -> Result<(), QueueError> {
        (**self).enqueue_capture(job).await
    }

    async fn claim_capture(&self) -> Result<Option<ClaimedJob>, QueueError> {
        (**self).claim_capture().await
    }

    async fn ack(&self, claimed: &ClaimedJob) -> Result<(), QueueError> {
        (**self).ack(claimed).await
    }

    async fn fail(&self, claimed: &ClaimedJob) -> Result<(), QueueError> {
        (**self).fail(claimed).await
    }

    async fn enqueue_evaluation(&self, job: &EvaluationJob) -> Result<(), QueueError> {
        (**self).enqueue_evaluation(job).await
    }
}
