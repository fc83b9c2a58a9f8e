// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::browser_engine::{BrowserError, BrowserSession};
use chromiumoxide::page::Page;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// 页面上下文池
///
/// 固定大小的标签页池，约束单个任务内同时渲染的页面数量。
/// 每次捕获按URL检出一个独立标签页，归还时关闭，
/// 通过作用域守卫保证出错路径上也会释放。
pub struct PagePool {
    session: Arc<BrowserSession>,
    semaphore: Arc<Semaphore>,
}

impl PagePool {
    /// 创建新的页面池
    ///
    /// # 参数
    ///
    /// * `session` - 任务共享的浏览器会话
    /// * `size` - 并发页面上限
    pub fn new(session: Arc<BrowserSession>, size: usize) -> Self {
        Self {
            session,
            semaphore: Arc::new(Semaphore::new(size.max(1))),
        }
    }

    /// 检出一个标签页
    ///
    /// 池满时等待其他捕获归还。
    pub async fn checkout(&self) -> Result<PageGuard, BrowserError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BrowserError::Other(e.to_string()))?;

        let page = self.session.new_page().await?;

        Ok(PageGuard {
            page: Some(page),
            _permit: permit,
        })
    }
}

/// 标签页守卫
///
/// 析构时关闭标签页并释放池槽位。
pub struct PageGuard {
    page: Option<Page>,
    _permit: OwnedSemaphorePermit,
}

impl PageGuard {
    /// 访问检出的标签页
    pub fn page(&self) -> &Page {
        // 仅在 Drop 中置空，检出期间恒为 Some
        self.page.as_ref().expect("page taken before drop")
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            tokio::spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}
