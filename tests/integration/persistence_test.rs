// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内容持久化集成测试
//!
//! 覆盖内容寻址、双文件落库、存储重试与事务回滚。

use async_trait::async_trait;
use pagewatch::domain::models::capture_result::PageArtifacts;
use pagewatch::domain::models::content_item::{ContentFile, ContentItem, FileType};
use pagewatch::domain::repositories::content_repository::ContentRepository;
use pagewatch::domain::repositories::storage_repository::{StorageError, StorageRepository};
use pagewatch::domain::services::content_service::{hex_digest, ContentService, PersistError};
use pagewatch::infrastructure::repositories::content_repo_impl::ContentRepositoryImpl;
use pagewatch::infrastructure::storage::InMemoryStorage;
use pagewatch::utils::errors::RepositoryError;
use pagewatch::utils::retry_policy::RetryPolicy;
use sea_orm::{ConnectionTrait, Database, Schema};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// 内存版内容仓库，用于不依赖数据库的服务级测试
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

/// 前N次保存失败的存储，之后委托给内存存储
struct FlakyStorage {
    inner: InMemoryStorage,
    failures_left: AtomicU32,
    save_calls: AtomicU32,
}

impl FlakyStorage {
    fn new(failures: u32) -> Self {
        Self {
            inner: InMemoryStorage::new(),
            failures_left: AtomicU32::new(failures),
            save_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl StorageRepository for FlakyStorage {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StorageError::Other("simulated outage".to_string()));
        }
        self.inner.save(key, data).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }
}

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
        enable_jitter: false,
    }
}

fn sample_artifacts() -> PageArtifacts {
    PageArtifacts {
        html: b"<html><body>captured page</body></html>".to_vec(),
        screenshot: vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3],
    }
}

/// 一次持久化恰好产生一个条目与两条文件记录，摘要可复核
#[tokio::test]
async fn test_persist_creates_item_with_two_files() {
    let repo = Arc::new(MemoryContentRepository::default());
    let storage = Arc::new(InMemoryStorage::new());
    let service = ContentService::new(repo.clone(), storage.clone());

    let artifacts = sample_artifacts();
    let publisher_id = Uuid::new_v4();
    let scan_job_id = Uuid::new_v4();

    let item = service
        .persist(publisher_id, scan_job_id, "https://example.com/post", &artifacts)
        .await
        .unwrap();

    assert_eq!(item.publisher_id, publisher_id);
    assert_eq!(item.scan_job_id, scan_job_id);
    assert_eq!(item.url, "https://example.com/post");

    let files = repo.find_files(item.id).await.unwrap();
    assert_eq!(files.len(), 2);

    let html_file = files.iter().find(|f| f.file_type == FileType::Html).unwrap();
    let shot_file = files
        .iter()
        .find(|f| f.file_type == FileType::Screenshot)
        .unwrap();

    assert!(html_file.file_path.starts_with("html/"));
    assert!(html_file.file_path.ends_with(".html"));
    assert!(shot_file.file_path.starts_with("screenshots/"));
    assert!(shot_file.file_path.ends_with(".png"));

    // 记录的摘要与从存储取回的字节重新计算一致
    let stored_html = storage.get(&html_file.file_path).await.unwrap().unwrap();
    assert_eq!(hex_digest(&stored_html), html_file.sha256);
    assert_eq!(html_file.sha256, hex_digest(&artifacts.html));

    let stored_shot = storage.get(&shot_file.file_path).await.unwrap().unwrap();
    assert_eq!(hex_digest(&stored_shot), shot_file.sha256);
    assert_eq!(shot_file.sha256, hex_digest(&artifacts.screenshot));
}

/// 重复捕获同一URL会得到全新的键，不做基于摘要的去重
#[tokio::test]
async fn test_persist_generates_fresh_keys() {
    let repo = Arc::new(MemoryContentRepository::default());
    let storage = Arc::new(InMemoryStorage::new());
    let service = ContentService::new(repo.clone(), storage);

    let artifacts = sample_artifacts();
    let publisher_id = Uuid::new_v4();
    let scan_job_id = Uuid::new_v4();

    let first = service
        .persist(publisher_id, scan_job_id, "https://example.com/", &artifacts)
        .await
        .unwrap();
    let second = service
        .persist(publisher_id, scan_job_id, "https://example.com/", &artifacts)
        .await
        .unwrap();

    assert_ne!(first.id, second.id);

    let first_paths: Vec<String> = repo
        .find_files(first.id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.file_path)
        .collect();
    let second_paths: Vec<String> = repo
        .find_files(second.id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.file_path)
        .collect();

    for path in &second_paths {
        assert!(!first_paths.contains(path));
    }
}

/// 瞬时存储故障在重试内恢复，持久化仍然成功
#[tokio::test]
async fn test_persist_retries_transient_storage_failure() {
    let repo = Arc::new(MemoryContentRepository::default());
    let storage = Arc::new(FlakyStorage::new(2));
    let service = ContentService::with_retry(repo.clone(), storage.clone(), fast_retry(5));

    let item = service
        .persist(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "https://example.com/",
            &sample_artifacts(),
        )
        .await
        .unwrap();

    assert!(repo.find_item(item.id).await.unwrap().is_some());
    // 2次失败 + 2个产物各成功1次
    assert_eq!(storage.save_calls.load(Ordering::SeqCst), 4);
}

/// 重试耗尽后持久化失败，不留下半成品条目
#[tokio::test]
async fn test_persist_storage_failure_exhausts_retries() {
    let repo = Arc::new(MemoryContentRepository::default());
    let storage = Arc::new(FlakyStorage::new(u32::MAX));
    let service = ContentService::with_retry(repo.clone(), storage, fast_retry(3));

    let result = service
        .persist(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "https://example.com/",
            &sample_artifacts(),
        )
        .await;

    assert!(matches!(result, Err(PersistError::Storage(_))));
    assert!(repo.items.lock().await.is_empty());
}

/// 文件插入失败时整个事务回滚，不产生孤儿条目
#[tokio::test]
async fn test_create_with_files_rolls_back_on_failure() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    db.execute(backend.build(&schema.create_table_from_entity(
        pagewatch::infrastructure::database::entities::content_item::Entity,
    )))
    .await
    .unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(
        pagewatch::infrastructure::database::entities::content_file::Entity,
    )))
    .await
    .unwrap();

    let repo = ContentRepositoryImpl::new(Arc::new(db));

    let item = ContentItem {
        id: Uuid::new_v4(),
        publisher_id: Uuid::new_v4(),
        scan_job_id: Uuid::new_v4(),
        url: "https://example.com/".to_string(),
        captured_at: chrono::Utc::now().into(),
    };

    // 两条文件记录共用同一主键，第二条插入必然失败
    let duplicate_id = Uuid::new_v4();
    let files = vec![
        ContentFile {
            id: duplicate_id,
            content_item_id: item.id,
            file_type: FileType::Html,
            file_path: "html/x.html".to_string(),
            sha256: hex_digest(b"html"),
        },
        ContentFile {
            id: duplicate_id,
            content_item_id: item.id,
            file_type: FileType::Screenshot,
            file_path: "screenshots/x.png".to_string(),
            sha256: hex_digest(b"png"),
        },
    ];

    let result = repo.create_with_files(&item, &files).await;
    assert!(result.is_err());

    // 条目插入已被回滚
    assert!(repo.find_item(item.id).await.unwrap().is_none());
}

/// 成功路径下条目与文件记录一同可见
#[tokio::test]
async fn test_create_with_files_commits_item_and_files() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    db.execute(backend.build(&schema.create_table_from_entity(
        pagewatch::infrastructure::database::entities::content_item::Entity,
    )))
    .await
    .unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(
        pagewatch::infrastructure::database::entities::content_file::Entity,
    )))
    .await
    .unwrap();

    let repo = ContentRepositoryImpl::new(Arc::new(db));

    let item = ContentItem {
        id: Uuid::new_v4(),
        publisher_id: Uuid::new_v4(),
        scan_job_id: Uuid::new_v4(),
        url: "https://example.com/a".to_string(),
        captured_at: chrono::Utc::now().into(),
    };
    let files = vec![
        ContentFile {
            id: Uuid::new_v4(),
            content_item_id: item.id,
            file_type: FileType::Html,
            file_path: "html/a.html".to_string(),
            sha256: hex_digest(b"html"),
        },
        ContentFile {
            id: Uuid::new_v4(),
            content_item_id: item.id,
            file_type: FileType::Screenshot,
            file_path: "screenshots/a.png".to_string(),
            sha256: hex_digest(b"png"),
        },
    ];

    repo.create_with_files(&item, &files).await.unwrap();

    let found = repo.find_item(item.id).await.unwrap().unwrap();
    assert_eq!(found.url, item.url);
    assert_eq!(repo.find_files(item.id).await.unwrap().len(), 2);
}
