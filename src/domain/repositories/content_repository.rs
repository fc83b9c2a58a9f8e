// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::content_item::{ContentFile, ContentItem};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 内容仓库特质
///
/// 定义内容条目及其文件记录的数据访问接口
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// 在单个事务中创建一个内容条目及其全部文件记录
    ///
    /// 条目与文件要么同时落库，要么都不落库，不留下孤儿条目。
    async fn create_with_files(
        &self,
        item: &ContentItem,
        files: &[ContentFile],
    ) -> Result<(), RepositoryError>;

    /// 按ID查询内容条目
    async fn find_item(&self, id: Uuid) -> Result<Option<ContentItem>, RepositoryError>;

    /// 查询内容条目的全部文件记录
    async fn find_files(&self, content_item_id: Uuid)
        -> Result<Vec<ContentFile>, RepositoryError>;
}
