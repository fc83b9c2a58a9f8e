// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::domain::models::capture_result::{CaptureResult, PageArtifacts};
use crate::engines::context_pool::PagePool;
use crate::engines::traits::CaptureEngine;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 浏览器引擎错误类型
#[derive(Error, Debug)]
pub enum BrowserError {
    /// 导航或滚动稳定等待超时
    #[error("page operation timed out")]
    Timeout,

    /// 其他浏览器错误
    #[error("browser error: {0}")]
    Other(String),
}

/// 任务级浏览器会话
///
/// 基于 chromiumoxide 实现的无头浏览器会话。一次捕获任务
/// 启动一个会话，任务内所有页面共享该浏览器实例，任务结束
/// 时在所有退出路径上关闭。
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    settings: BrowserSettings,
}

impl BrowserSession {
    /// 启动或连接浏览器实例
    ///
    /// 设置 `CHROMIUM_REMOTE_DEBUGGING_URL` 时连接远端 Chrome，
    /// 否则在本地以无头模式启动。
    pub async fn launch(settings: BrowserSettings) -> Result<Self, BrowserError> {
        let remote_debugging_url = std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok();

        let (browser, mut handler) = if let Some(ref url) = remote_debugging_url {
            tracing::info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url)
                .await
                .map_err(|e| BrowserError::Other(format!("Failed to connect to remote Chrome: {}", e)))?
        } else {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(settings.navigation_timeout_secs));

            builder = builder.arg("--disable-gpu").arg("--disable-dev-shm-usage");

            Browser::launch(builder.build().map_err(|e| BrowserError::Other(e.to_string()))?)
                .await
                .map_err(|e| BrowserError::Other(e.to_string()))?
        };

        // 事件处理循环随会话存在
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            settings,
        })
    }

    /// 打开一个新的独立标签页
    pub async fn new_page(&self) -> Result<Page, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Other(e.to_string()))?;

        page.set_user_agent(self.settings.user_agent.as_str())
            .await
            .map_err(|e| BrowserError::Other(e.to_string()))?;

        Ok(page)
    }

    /// 在给定标签页中捕获一个URL
    ///
    /// 单个URL内部严格顺序执行：导航、自动滚动、HTML快照、整页截图。
    /// 每一步都带超时，超时转化为该URL的失败而不会挂起工作槽。
    pub async fn capture_page(&self, page: &Page, url: &str) -> Result<PageArtifacts, BrowserError> {
        let nav_timeout = Duration::from_secs(self.settings.navigation_timeout_secs);

        tokio::time::timeout(nav_timeout, page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout)?
            .map_err(|e| BrowserError::Other(e.to_string()))?;

        self.auto_scroll(page).await?;

        let html = tokio::time::timeout(nav_timeout, page.content())
            .await
            .map_err(|_| BrowserError::Timeout)?
            .map_err(|e| BrowserError::Other(e.to_string()))?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        let screenshot = tokio::time::timeout(nav_timeout, page.screenshot(params))
            .await
            .map_err(|_| BrowserError::Timeout)?
            .map_err(|e| BrowserError::Other(format!("Page screenshot failed: {}", e)))?;

        Ok(PageArtifacts {
            html: html.into_bytes(),
            screenshot,
        })
    }

    /// 自动滚动到页面底部直到内容高度稳定
    ///
    /// 有界轮询：反复滚到底并等待稳定间隔，高度不再增长或达到
    /// 迭代上限即停止，防止无限滚动页面导致不终止。
    async fn auto_scroll(&self, page: &Page) -> Result<(), BrowserError> {
        let settle = Duration::from_millis(self.settings.scroll_settle_ms);
        let mut last_height: f64 = -1.0;

        for iteration in 0..self.settings.scroll_max_iterations {
            let height: f64 = page
                .evaluate("document.body.scrollHeight")
                .await
                .map_err(|e| BrowserError::Other(e.to_string()))?
                .into_value()
                .map_err(|e| BrowserError::Other(e.to_string()))?;

            if height <= last_height {
                debug!(iteration, height, "scroll height stable, stopping auto-scroll");
                break;
            }
            last_height = height;

            page.evaluate("window.scrollTo(0, document.body.scrollHeight);")
                .await
                .map_err(|e| BrowserError::Other(format!("Scroll failed: {}", e)))?;

            tokio::time::sleep(settle).await;
        }

        // 截图前回到页首，避免懒加载占位停留在视口外状态
        page.evaluate("window.scrollTo(0, 0);")
            .await
            .map_err(|e| BrowserError::Other(format!("Scroll failed: {}", e)))?;

        Ok(())
    }

    /// 关闭浏览器会话
    ///
    /// 编排器在所有退出路径（包括任务失败）上调用。
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

/// 基于浏览器会话与标签页池的捕获引擎
///
/// 每次捕获从池中检出一个标签页，产物到手后立即归还槽位。
pub struct BrowserCaptureEngine {
    session: Arc<BrowserSession>,
    pool: PagePool,
}

impl BrowserCaptureEngine {
    /// 创建新的捕获引擎
    ///
    /// # 参数
    ///
    /// * `session` - 任务共享的浏览器会话
    /// * `concurrency` - 同时渲染的页面上限
    pub fn new(session: Arc<BrowserSession>, concurrency: usize) -> Self {
        let pool = PagePool::new(session.clone(), concurrency);
        Self { session, pool }
    }
}

#[async_trait]
impl CaptureEngine for BrowserCaptureEngine {
    async fn capture(&self, url: &str) -> CaptureResult {
        let guard = match self.pool.checkout().await {
            Ok(guard) => guard,
            Err(e) => return CaptureResult::failed(url, format!("page checkout failed: {}", e)),
        };

        match self.session.capture_page(guard.page(), url).await {
            Ok(artifacts) => CaptureResult::captured(url, artifacts.html, artifacts.screenshot),
            Err(e) => CaptureResult::failed(url, e.to_string()),
        }
    }
}
