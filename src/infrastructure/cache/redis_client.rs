// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;

/// Redis客户端
///
/// 提供队列所需的列表操作的异步接口
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - 创建过程中出现的错误
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 向列表头部推入一个元素
    pub async fn lpush(&self, key: &str, value: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.lpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// 从源列表尾部弹出一个元素并推入目标列表头部
    ///
    /// 原子操作，作为可靠队列的认领步骤使用。
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(String))` - 被移动的元素
    /// * `Ok(None)` - 源列表为空
    pub async fn rpoplpush(&self, source: &str, destination: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.rpoplpush(source, destination).await?;
        Ok(value)
    }

    /// 从列表中移除与给定值相等的元素
    ///
    /// # 返回值
    ///
    /// * `Ok(i64)` - 实际移除的元素个数
    pub async fn lrem(&self, key: &str, count: isize, value: &str) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let removed: i64 = con.lrem(key, count, value).await?;
        Ok(removed)
    }

    /// 获取列表长度
    pub async fn llen(&self, key: &str) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let len: i64 = con.llen(key).await?;
        Ok(len)
    }
}
