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

use crate::domain::models::capture_result::PageArtifacts;
use crate::domain::models::content_item::{ContentFile, ContentItem, FileType};
use crate::domain::repositories::content_repository::ContentRepository;
use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};
use crate::utils::errors::RepositoryError;
use crate::utils::retry_policy::RetryPolicy;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// 持久化错误类型
#[derive(Error, Debug)]
pub enum PersistError {
    /// 产物上传失败
    #[error("storage upload failed: {0}")]
    Storage(#[from] StorageError),

    /// 数据库写入失败
    #[error("repository write failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// 内容寻址与持久化服务
///
/// 对成功捕获的页面产物计算SHA-256摘要，上传至对象存储，
/// 并在单个事务中写入内容条目与两条文件记录。
/// 存储键使用新生成的UUID而非内容摘要：重复内容会被冗余
/// 存储，以换取实现上的简单。
pub struct ContentService<CR, ST>
where
    CR: ContentRepository,
    ST: StorageRepository + ?Sized,
{
    content_repo: Arc<CR>,
    storage: Arc<ST>,
    retry: RetryPolicy,
}

impl<CR, ST> ContentService<CR, ST>
where
    CR: ContentRepository,
    ST: StorageRepository + ?Sized,
{
    /// 创建新的持久化服务实例
    pub fn new(content_repo: Arc<CR>, storage: Arc<ST>) -> Self {
        Self {
            content_repo,
            storage,
            retry: RetryPolicy::standard(),
        }
    }

    /// 使用自定义重试策略创建实例
    pub fn with_retry(content_repo: Arc<CR>, storage: Arc<ST>, retry: RetryPolicy) -> Self {
        Self {
            content_repo,
            storage,
            retry,
        }
    }

    /// 持久化单个页面的捕获产物
    ///
    /// # 参数
    ///
    /// * `publisher_id` / `scan_job_id` - 所属任务标识
    /// * `url` - 页面URL
    /// * `artifacts` - 捕获产物（HTML与截图）
    ///
    /// # 返回值
    ///
    /// * `Ok(ContentItem)` - 已落库的内容条目，恰好拥有两条文件记录
    /// * `Err(PersistError)` - 重试耗尽后的上传或写库失败
    pub async fn persist(
        &self,
        publisher_id: Uuid,
        scan_job_id: Uuid,
        url: &str,
        artifacts: &PageArtifacts,
    ) -> Result<ContentItem, PersistError> {
        let html_sha256 = hex_digest(&artifacts.html);
        let screenshot_sha256 = hex_digest(&artifacts.screenshot);

        // 每个产物一个新UUID键，刻意不做基于摘要的去重
        let html_key = format!("html/{}.html", Uuid::new_v4());
        let screenshot_key = format!("screenshots/{}.png", Uuid::new_v4());

        self.save_with_retry(&html_key, &artifacts.html).await?;
        self.save_with_retry(&screenshot_key, &artifacts.screenshot)
            .await?;

        let item = ContentItem {
            id: Uuid::new_v4(),
            publisher_id,
            scan_job_id,
            url: url.to_string(),
            captured_at: Utc::now().into(),
        };

        let files = vec![
            ContentFile {
                id: Uuid::new_v4(),
                content_item_id: item.id,
                file_type: FileType::Html,
                file_path: html_key,
                sha256: html_sha256,
            },
            ContentFile {
                id: Uuid::new_v4(),
                content_item_id: item.id,
                file_type: FileType::Screenshot,
                file_path: screenshot_key,
                sha256: screenshot_sha256,
            },
        ];

        self.insert_with_retry(&item, &files).await?;

        debug!(content_item_id = %item.id, url, "content item persisted");
        Ok(item)
    }

    /// 带重试的产物上传
    async fn save_with_retry(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut attempt = 1u32;
        loop {
            match self.storage.save(key, data).await {
                Ok(()) => return Ok(()),
                Err(e) if self.retry.should_retry(attempt) => {
                    let backoff = self.retry.calculate_backoff(attempt);
                    warn!(key, attempt, error = %e, "artifact upload failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 带重试的事务写库
    async fn insert_with_retry(
        &self,
        item: &ContentItem,
        files: &[ContentFile],
    ) -> Result<(), RepositoryError> {
        let mut attempt = 1u32;
        loop {
            match self.content_repo.create_with_files(item, files).await {
                Ok(()) => return Ok(()),
                Err(e) if self.retry.should_retry(attempt) => {
                    let backoff = self.retry.calculate_backoff(attempt);
                    warn!(content_item_id = %item.id, attempt, error = %e, "content insert failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// 计算字节串的SHA-256十六进制摘要
pub fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
