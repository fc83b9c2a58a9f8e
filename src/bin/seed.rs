// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 捕获任务投递工具
//!
//! 将一个捕获任务放入捕获队列：
//!
//! ```text
//! seed <publisher_id> <scan_job_id> [max_pages]
//! ```

use pagewatch::config::settings::Settings;
use pagewatch::domain::models::capture_job::CaptureJob;
use pagewatch::infrastructure::cache::redis_client::RedisClient;
use pagewatch::queue::job_queue::{JobQueue, RedisJobQueue};
use pagewatch::utils::telemetry;
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        anyhow::bail!("usage: seed <publisher_id> <scan_job_id> [max_pages]");
    }

    let publisher_id: Uuid = args[1]
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid publisher_id: {}", e))?;
    let scan_job_id: Uuid = args[2]
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid scan_job_id: {}", e))?;
    let max_pages: Option<u64> = match args.get(3) {
        Some(raw) => Some(
            raw.parse()
                .map_err(|e| anyhow::anyhow!("invalid max_pages: {}", e))?,
        ),
        None => None,
    };

    let settings = Settings::new()?;
    let redis_client = RedisClient::new(&settings.redis.url).await?;
    let queue = RedisJobQueue::new(redis_client);

    let job = CaptureJob {
        publisher_id,
        scan_job_id,
        max_pages,
    };

    queue
        .enqueue_capture(&job)
        .await
        .map_err(|e| anyhow::anyhow!("enqueue failed: {}", e))?;

    let backlog = queue
        .pending_capture_len()
        .await
        .map_err(|e| anyhow::anyhow!("backlog query failed: {}", e))?;

    info!(%publisher_id, %scan_job_id, ?max_pages, backlog, "capture job enqueued");
    Ok(())
}
