// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 捕获流水线集成测试
//!
//! 用替身捕获引擎驱动完整的捕获-持久化-派发流水线，
//! 验证成功/跳过计数以及失败URL不落库、不派发评估。

use async_trait::async_trait;
use pagewatch::domain::models::capture_job::{CaptureJob, EvaluationJob};
use pagewatch::domain::models::capture_result::{CaptureResult, JobSummary};
use pagewatch::domain::models::content_item::{ContentFile, ContentItem};
use pagewatch::domain::repositories::content_repository::ContentRepository;
use pagewatch::domain::services::content_service::ContentService;
use pagewatch::engines::traits::CaptureEngine;
use pagewatch::infrastructure::storage::InMemoryStorage;
use pagewatch::queue::job_queue::{ClaimedJob, JobQueue, QueueError};
use pagewatch::utils::errors::RepositoryError;
use pagewatch::utils::retry_policy::RetryPolicy;
use pagewatch::workers::capture_worker::run_capture_pipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// 替身捕获引擎：指定的URL导航失败，其余成功
struct StubCaptureEngine {
    failing_url: Option<String>,
}

#[async_trait]
impl CaptureEngine for StubCaptureEngine {
    async fn capture(&self, url: &str) -> CaptureResult {
        if self.failing_url.as_deref() == Some(url) {
            return CaptureResult::failed(url, "navigation timed out");
        }
        CaptureResult::captured(
            url,
            format!("<html><body>{}</body></html>", url).into_bytes(),
            vec![0x89, 0x50, 0x4e, 0x47, 1, 2, 3],
        )
    }
}

/// 内存版内容仓库
#[derive(Default)]
struct MemoryContentRepository {
    items: Mutex<Vec<ContentItem>>,
    files: Mutex<Vec<ContentFile>>,
}

#[async_trait]
impl ContentRepository for MemoryContentRepository {
    async fn create_with_files(
        &self,
        item: &ContentItem,
        files: &[ContentFile],
    ) -> Result<(), RepositoryError> {
        self.items.lock().await.push(item.clone());
        self.files.lock().await.extend_from_slice(files);
        Ok(())
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<ContentItem>, RepositoryError> {
        Ok(self.items.lock().await.iter().find(|i| i.id == id).cloned())
    }

    async fn find_files(
        &self,
        content_item_id: Uuid,
    ) -> Result<Vec<ContentFile>, RepositoryError> {
        Ok(self
            .files
            .lock()
            .await
            .iter()
            .filter(|f| f.content_item_id == content_item_id)
            .cloned()
            .collect())
    }
}

/// 只记录评估任务的队列替身
#[derive(Default)]
struct RecordingQueue {
    evaluations: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue_capture(&self, _job: &CaptureJob) -> Result<(), QueueError> {
        Ok(())
    }

    async fn claim_capture(&self) -> Result<Option<ClaimedJob>, QueueError> {
        Ok(None)
    }

    async fn ack(&self, _claimed: &ClaimedJob) -> Result<(), QueueError> {
        Ok(())
    }

    async fn fail(&self, _claimed: &ClaimedJob) -> Result<(), QueueError> {
        Ok(())
    }

    async fn enqueue_evaluation(&self, job: &EvaluationJob) -> Result<(), QueueError> {
        self.evaluations.lock().await.push(job.content_item_id);
        Ok(())
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
        enable_jitter: false,
    }
}

fn sample_job() -> CaptureJob {
    CaptureJob {
        publisher_id: Uuid::new_v4(),
        scan_job_id: Uuid::new_v4(),
        max_pages: None,
    }
}

/// 5个URL中1个导航失败：4个条目8条文件4个评估任务，跳过1个
#[tokio::test]
async fn test_pipeline_counts_one_navigation_failure() {
    let urls: Vec<String> = (1..=5)
        .map(|i| format!("https://example.com/post/{}", i))
        .collect();
    let engine = StubCaptureEngine {
        failing_url: Some(urls[2].clone()),
    };

    let repo = Arc::new(MemoryContentRepository::default());
    let storage = Arc::new(InMemoryStorage::new());
    let service = ContentService::new(repo.clone(), storage);
    let queue = RecordingQueue::default();
    let job = sample_job();

    let summary =
        run_capture_pipeline(&engine, &service, &queue, &fast_retry(), &job, &urls, 2).await;

    assert_eq!(
        summary,
        JobSummary {
            discovered: 5,
            captured: 4,
            skipped: 1,
        }
    );

    let items = repo.items.lock().await;
    let files = repo.files.lock().await;
    assert_eq!(items.len(), 4);
    assert_eq!(files.len(), 8);

    // 失败的URL没有落库
    assert!(items.iter().all(|i| i.url != urls[2]));

    // 每个落库条目恰好派发一个评估任务
    let evaluations = queue.evaluations.lock().await;
    assert_eq!(evaluations.len(), 4);
    for item in items.iter() {
        assert!(evaluations.contains(&item.id));
    }
}

/// 全部成功时没有跳过计数
#[tokio::test]
async fn test_pipeline_all_captured() {
    let urls: Vec<String> = (1..=3)
        .map(|i| format!("https://example.com/{}", i))
        .collect();
    let engine = StubCaptureEngine { failing_url: None };

    let repo = Arc::new(MemoryContentRepository::default());
    let service = ContentService::new(repo.clone(), Arc::new(InMemoryStorage::new()));
    let queue = RecordingQueue::default();

    let summary =
        run_capture_pipeline(&engine, &service, &queue, &fast_retry(), &sample_job(), &urls, 4)
            .await;

    assert_eq!(
        summary,
        JobSummary {
            discovered: 3,
            captured: 3,
            skipped: 0,
        }
    );
    assert_eq!(queue.evaluations.lock().await.len(), 3);
}

/// 单个失败URL不产生任何副作用
#[tokio::test]
async fn test_pipeline_failed_capture_emits_nothing() {
    let urls = vec!["https://example.com/broken".to_string()];
    let engine = StubCaptureEngine {
        failing_url: Some(urls[0].clone()),
    };
    assert!(!engine.capture(&urls[0]).await.succeeded());

    let repo = Arc::new(MemoryContentRepository::default());
    let service = ContentService::new(repo.clone(), Arc::new(InMemoryStorage::new()));
    let queue = RecordingQueue::default();

    let summary =
        run_capture_pipeline(&engine, &service, &queue, &fast_retry(), &sample_job(), &urls, 1)
            .await;

    assert_eq!(summary.captured, 0);
    assert_eq!(summary.skipped, 1);
    assert!(repo.items.lock().await.is_empty());
    assert!(repo.files.lock().await.is_empty());
    assert!(queue.evaluations.lock().await.is_empty());
}
