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

use crate::domain::models::channel::{Channel, PLATFORM_WEBSITE};
use crate::domain::repositories::channel_repository::ChannelRepository;
use crate::infrastructure::database::entities::publisher_channel as channel_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 频道仓库实现
pub struct ChannelRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ChannelRepositoryImpl {
    /// 创建新的频道仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChannelRepository for ChannelRepositoryImpl {
    async fn find_website_channel(
        &self,
        publisher_id: Uuid,
    ) -> Result<Option<Channel>, RepositoryError> {
        let model = channel_entity::Entity::find()
            .filter(channel_entity::Column::PublisherId.eq(publisher_id))
            .filter(channel_entity::Column::Platform.eq(PLATFORM_WEBSITE))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(|m| Channel {
            id: m.id,
            publisher_id: m.publisher_id,
            platform: m.platform,
            channel_url: m.channel_url,
        }))
    }
}
