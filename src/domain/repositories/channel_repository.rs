// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::channel::Channel;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 频道仓库特质
///
/// 定义对 `publisher_channels` 的只读访问接口
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// 查询发布者的网站频道
    ///
    /// 按 `publisher_id` 与 `platform = 'website'` 过滤。
    async fn find_website_channel(
        &self,
        publisher_id: Uuid,
    ) -> Result<Option<Channel>, RepositoryError>;
}
