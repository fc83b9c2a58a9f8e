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

use pagewatch::config::settings::Settings;
use pagewatch::domain::services::content_service::ContentService;
use pagewatch::domain::services::discovery_service::DiscoveryService;
use pagewatch::infrastructure::cache::redis_client::RedisClient;
use pagewatch::infrastructure::database::connection;
use pagewatch::infrastructure::repositories::channel_repo_impl::ChannelRepositoryImpl;
use pagewatch::infrastructure::repositories::content_repo_impl::ContentRepositoryImpl;
use pagewatch::infrastructure::storage::create_storage_repository;
use pagewatch::queue::job_queue::RedisJobQueue;
use pagewatch::utils::telemetry;
use pagewatch::workers::manager::WorkerManager;
use std::sync::Arc;
use tracing::info;

use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动捕获工作器
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting pagewatch...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Redis Client and job queue
    let redis_client = RedisClient::new(&settings.redis.url).await?;
    let queue = Arc::new(RedisJobQueue::new(redis_client));
    info!("Redis job queue initialized");

    // 5. Initialize Storage
    let storage = create_storage_repository(&settings.storage)
        .map_err(|e| anyhow::anyhow!("storage init failed: {}", e))?;
    info!("Storage initialized ({})", settings.storage.storage_type);

    // 6. Initialize Components
    let channel_repo = Arc::new(ChannelRepositoryImpl::new(db.clone()));
    let content_repo = Arc::new(ContentRepositoryImpl::new(db.clone()));
    let content_service = Arc::new(ContentService::new(content_repo, storage));
    let discovery = Arc::new(DiscoveryService::from_settings(
        &settings.browser,
        &settings.discovery,
    )?);

    // 7. Start Workers
    let mut worker_manager = WorkerManager::new(
        channel_repo,
        content_service,
        queue,
        discovery,
        settings.browser.clone(),
        settings.worker.clone(),
    );
    worker_manager.start_workers(settings.worker.count).await;
    info!("Started {} capture worker(s)", settings.worker.count);

    // 8. Wait for shutdown signal
    worker_manager.wait_for_shutdown().await;

    Ok(())
}
