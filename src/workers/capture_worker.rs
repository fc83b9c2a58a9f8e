// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::settings::{BrowserSettings, WorkerSettings};
use crate::domain::models::capture_job::{CaptureJob, EvaluationJob};
use crate::domain::models::capture_result::{CaptureOutcome, JobSummary};
use crate::domain::repositories::channel_repository::ChannelRepository;
use crate::domain::repositories::content_repository::ContentRepository;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::services::content_service::ContentService;
use crate::domain::services::discovery_service::{DiscoveryError, DiscoveryService};
use crate::engines::browser_engine::{BrowserCaptureEngine, BrowserSession};
use crate::engines::traits::CaptureEngine;
use crate::queue::job_queue::JobQueue;
use crate::utils::errors::WorkerError;
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::worker::Worker;

/// 任务级失败分类
///
/// 可重试失败退回队列等待重投，不可重试失败确认后丢弃。
enum JobFailure {
    Fatal(String),
    Retryable(String),
}

/// 捕获工作者
///
/// 从捕获队列认领任务并完整执行：解析频道、发现URL、
/// 启动浏览器会话、并发捕获各页面、持久化产物、
/// 为每个成功条目派发评估任务。
pub struct CaptureWorker<CH, CR, ST, Q>
where
    CH: ChannelRepository,
    CR: ContentRepository,
    ST: StorageRepository + ?Sized,
    Q: JobQueue,
{
    channel_repo: Arc<CH>,
    content_service: Arc<ContentService<CR, ST>>,
    queue: Arc<Q>,
    discovery: Arc<DiscoveryService>,
    browser_settings: BrowserSettings,
    worker_settings: WorkerSettings,
    worker_id: Uuid,
}

impl<CH, CR, ST, Q> CaptureWorker<CH, CR, ST, Q>
where
    CH: ChannelRepository,
    CR: ContentRepository,
    ST: StorageRepository + ?Sized,
    Q: JobQueue,
{
    /// 创建新的捕获工作器实例
    pub fn new(
        channel_repo: Arc<CH>,
        content_service: Arc<ContentService<CR, ST>>,
        queue: Arc<Q>,
        discovery: Arc<DiscoveryService>,
        browser_settings: BrowserSettings,
        worker_settings: WorkerSettings,
    ) -> Self {
        Self {
            channel_repo,
            content_service,
            queue,
            discovery,
            browser_settings,
            worker_settings,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 工作器主循环
    ///
    /// 队列为空时按配置的间隔轮询。认领到的任务处理完毕后确认，
    /// 可重试失败退回队列，至少一次投递由队列语义保证。
    pub async fn run_loop(&self) {
        info!("Capture worker {} started", self.worker_id);
        let poll_interval = Duration::from_secs(self.worker_settings.poll_interval_secs);

        loop {
            match self.queue.claim_capture().await {
                Ok(Some(claimed)) => {
                    match self.process_job(&claimed.job).await {
                        Ok(summary) => {
                            info!(
                                discovered = summary.discovered,
                                captured = summary.captured,
                                skipped = summary.skipped,
                                "capture job complete"
                            );
                            if let Err(e) = self.queue.ack(&claimed).await {
                                error!(error = %e, "failed to ack capture job");
                            }
                        }
                        Err(JobFailure::Fatal(msg)) => {
                            error!(reason = %msg, "capture job failed permanently, dropped");
                            if let Err(e) = self.queue.ack(&claimed).await {
                                error!(error = %e, "failed to ack capture job");
                            }
                        }
                        Err(JobFailure::Retryable(msg)) => {
                            error!(reason = %msg, "capture job failed, requeued");
                            if let Err(e) = self.queue.fail(&claimed).await {
                                error!(error = %e, "failed to requeue capture job");
                            }
                            sleep(poll_interval).await;
                        }
                    }
                }
                Ok(None) => sleep(poll_interval).await,
                Err(e) => {
                    error!(error = %e, "failed to claim capture job");
                    sleep(poll_interval).await;
                }
            }
        }
    }

    /// 处理单个捕获任务
    #[instrument(skip(self, job), fields(publisher_id = %job.publisher_id, scan_job_id = %job.scan_job_id))]
    async fn process_job(&self, job: &CaptureJob) -> Result<JobSummary, JobFailure> {
        info!("Processing capture job");

        let channel = self
            .channel_repo
            .find_website_channel(job.publisher_id)
            .await
            .map_err(|e| JobFailure::Retryable(format!("channel lookup failed: {}", e)))?
            .ok_or_else(|| {
                JobFailure::Fatal(format!(
                    "publisher {} has no website channel",
                    job.publisher_id
                ))
            })?;

        let urls = self
            .discovery
            .discover(&channel.channel_url, job.max_pages)
            .await
            .map_err(|e| match e {
                DiscoveryError::Unreachable(msg) => {
                    JobFailure::Retryable(format!("channel unreachable: {}", msg))
                }
                DiscoveryError::InvalidChannelUrl(msg) => {
                    JobFailure::Fatal(format!("invalid channel url: {}", msg))
                }
            })?;

        if urls.is_empty() {
            warn!(channel = %channel.channel_url, "no urls discovered, nothing to capture");
            return Ok(JobSummary::default());
        }

        let session = BrowserSession::launch(self.browser_settings.clone())
            .await
            .map_err(|e| JobFailure::Retryable(format!("browser launch failed: {}", e)))?;
        let session = Arc::new(session);

        // 捕获阶段不会使任务失败，单URL失败只记为跳过
        let summary = self.capture_all(job, &urls, session.clone()).await;

        // 所有退出路径都要关闭浏览器；此处是唯一持有者
        match Arc::try_unwrap(session) {
            Ok(session) => session.close().await,
            Err(_) => warn!("browser session still referenced at job end, close skipped"),
        }

        Ok(summary)
    }

    /// 有界并发地捕获并持久化所有URL
    async fn capture_all(
        &self,
        job: &CaptureJob,
        urls: &[String],
        session: Arc<BrowserSession>,
    ) -> JobSummary {
        let concurrency = self.browser_settings.max_concurrent_pages.max(1);
        let engine = BrowserCaptureEngine::new(session, concurrency);
        let retry = RetryPolicy::dispatch(self.worker_settings.dispatch_max_retries);

        run_capture_pipeline(
            &engine,
            self.content_service.as_ref(),
            self.queue.as_ref(),
            &retry,
            job,
            urls,
            concurrency,
        )
        .await
    }
}

/// 对发现的URL集执行捕获、持久化、派发流水线
///
/// 有界并发推进。单URL失败（捕获或持久化）只计为跳过，
/// 不中断其余URL，失败的URL不落库也不派发评估。
pub async fn run_capture_pipeline<E, CR, ST, Q>(
    engine: &E,
    content_service: &ContentService<CR, ST>,
    queue: &Q,
    dispatch_retry: &RetryPolicy,
    job: &CaptureJob,
    urls: &[String],
    concurrency: usize,
) -> JobSummary
where
    E: CaptureEngine + ?Sized,
    CR: ContentRepository,
    ST: StorageRepository + ?Sized,
    Q: JobQueue + ?Sized,
{
    // 先把每个URL的future收集成具体集合再交给流驱动
    let tasks: Vec<_> = urls
        .iter()
        .map(|url| process_url(engine, content_service, queue, dispatch_retry, job, url))
        .collect();

    let outcomes: Vec<bool> = stream::iter(tasks)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let captured = outcomes.iter().filter(|ok| **ok).count();
    JobSummary {
        discovered: urls.len(),
        captured,
        skipped: urls.len() - captured,
    }
}

/// 捕获单个URL并持久化其产物
///
/// 任何一步失败都只跳过该URL，返回是否成功。
async fn process_url<E, CR, ST, Q>(
    engine: &E,
    content_service: &ContentService<CR, ST>,
    queue: &Q,
    dispatch_retry: &RetryPolicy,
    job: &CaptureJob,
    url: &str,
) -> bool
where
    E: CaptureEngine + ?Sized,
    CR: ContentRepository,
    ST: StorageRepository + ?Sized,
    Q: JobQueue + ?Sized,
{
    let result = engine.capture(url).await;
    let artifacts = match result.outcome {
        CaptureOutcome::Captured(artifacts) => artifacts,
        CaptureOutcome::Failed(reason) => {
            warn!(url, reason = %reason, "page capture failed, url skipped");
            return false;
        }
    };

    let item = match content_service
        .persist(job.publisher_id, job.scan_job_id, url, &artifacts)
        .await
    {
        Ok(item) => item,
        Err(e) => {
            warn!(url, error = %e, "persistence failed, url skipped");
            return false;
        }
    };

    dispatch_evaluation(queue, dispatch_retry, item.id).await;
    true
}

/// 为已持久化的内容条目派发评估任务
///
/// 带退避重试；重试耗尽时条目保持已落库状态，
/// 记录其ID供后续人工补投。返回是否派发成功。
pub async fn dispatch_evaluation<Q>(queue: &Q, retry: &RetryPolicy, content_item_id: Uuid) -> bool
where
    Q: JobQueue + ?Sized,
{
    let evaluation = EvaluationJob { content_item_id };

    let mut attempt = 1u32;
    loop {
        match queue.enqueue_evaluation(&evaluation).await {
            Ok(()) => return true,
            Err(e) if retry.should_retry(attempt) => {
                let backoff = retry.calculate_backoff(attempt);
                warn!(%content_item_id, attempt, error = %e, "evaluation dispatch failed, retrying");
                sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    %content_item_id,
                    error = %e,
                    "evaluation dispatch abandoned after retries, item remains persisted"
                );
                return false;
            }
        }
    }
}

#[async_trait::async_trait]
impl<CH, CR, ST, Q> Worker for CaptureWorker<CH, CR, ST, Q>
where
    CH: ChannelRepository,
    CR: ContentRepository,
    ST: StorageRepository + ?Sized,
    Q: JobQueue,
{
    async fn run(&self) -> Result<(), WorkerError> {
        self.run_loop().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "capture-worker"
    }
}
