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

use crate::domain::models::content_item::{ContentFile, ContentItem, FileType};
use crate::domain::repositories::content_repository::ContentRepository;
use crate::infrastructure::database::entities::content_file as file_entity;
use crate::infrastructure::database::entities::content_item as item_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// 内容仓库实现
pub struct ContentRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ContentRepositoryImpl {
    /// 创建新的内容仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentRepository for ContentRepositoryImpl {
    /// 在单个事务中创建内容条目及其文件记录
    ///
    /// 文件插入失败时整个事务回滚，不留下孤儿条目。
    async fn create_with_files(
        &self,
        item: &ContentItem,
        files: &[ContentFile],
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let item_model = item_entity::ActiveModel {
            id: Set(item.id),
            publisher_id: Set(item.publisher_id),
            scan_job_id: Set(item.scan_job_id),
            url: Set(item.url.clone()),
            captured_at: Set(item.captured_at),
        };
        item_entity::Entity::insert(item_model).exec(&txn).await?;

        for file in files {
            let file_model = file_entity::ActiveModel {
                id: Set(file.id),
                content_item_id: Set(file.content_item_id),
                file_type: Set(file.file_type.to_string()),
                file_path: Set(file.file_path.clone()),
                sha256: Set(file.sha256.clone()),
                created_at: Set(Utc::now().into()),
            };
            file_entity::Entity::insert(file_model).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<ContentItem>, RepositoryError> {
        let model = item_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(|m| ContentItem {
            id: m.id,
            publisher_id: m.publisher_id,
            scan_job_id: m.scan_job_id,
            url: m.url,
            captured_at: m.captured_at,
        }))
    }

    async fn find_files(
        &self,
        content_item_id: Uuid,
    ) -> Result<Vec<ContentFile>, RepositoryError> {
        let models = file_entity::Entity::find()
            .filter(file_entity::Column::ContentItemId.eq(content_item_id))
            .all(self.db.as_ref())
            .await?;

        models
            .into_iter()
            .map(|m| {
                let file_type = FileType::from_str(&m.file_type)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
                Ok(ContentFile {
                    id: m.id,
                    content_item_id: m.content_item_id,
                    file_type,
                    file_path: m.file_path,
                    sha256: m.sha256,
                })
            })
            .collect()
    }
}
