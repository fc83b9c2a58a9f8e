// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{BrowserSettings, WorkerSettings};
use crate::domain::repositories::channel_repository::ChannelRepository;
use crate::domain::repositories::content_repository::ContentRepository;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::services::content_service::ContentService;
use crate::domain::services::discovery_service::DiscoveryService;
use crate::queue::job_queue::JobQueue;
use crate::workers::capture_worker::CaptureWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager<CH, CR, ST, Q>
where
    CH: ChannelRepository + 'static,
    CR: ContentRepository + 'static,
    ST: StorageRepository + ?Sized + 'static,
    Q: JobQueue + 'static,
{
    channel_repo: Arc<CH>,
    content_service: Arc<ContentService<CR, ST>>,
    queue: Arc<Q>,
    discovery: Arc<DiscoveryService>,
    browser_settings: BrowserSettings,
    worker_settings: WorkerSettings,
    handles: Vec<JoinHandle<()>>,
}

impl<CH, CR, ST, Q> WorkerManager<CH, CR, ST, Q>
where
    CH: ChannelRepository + 'static,
    CR: ContentRepository + 'static,
    ST: StorageRepository + ?Sized + 'static,
    Q: JobQueue + 'static,
{
    pub fn new(
        channel_repo: Arc<CH>,
        content_service: Arc<ContentService<CR, ST>>,
        queue: Arc<Q>,
        discovery: Arc<DiscoveryService>,
        browser_settings: BrowserSettings,
        worker_settings: WorkerSettings,
    ) -> Self {
        Self {
            channel_repo,
            content_service,
            queue,
            discovery,
            browser_settings,
            worker_settings,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub async fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let worker = CaptureWorker::new(
                self.channel_repo.clone(),
                self.content_service.clone(),
                self.queue.clone(),
                self.discovery.clone(),
                self.browser_settings.clone(),
                self.worker_settings.clone(),
            );

            // We spawn the worker loop on a separate task to avoid blocking the main thread
            // or the loop that spawns workers.
            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("Capture worker exited with error: {}", e);
                }
            });
            self.handles.push(handle);
        }
    }

    /// 等待关闭信号并关闭工作进程
    ///
    /// 监听关闭信号并优雅地关闭所有工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        for handle in &self.handles {
            handle.abort();
        }

        info!("Workers shut down successfully");
    }
}
