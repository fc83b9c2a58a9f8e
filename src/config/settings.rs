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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、Redis、存储、浏览器和发现引擎等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// URL发现配置
    pub discovery: DiscoverySettings,
    /// 工作器配置
    pub worker: WorkerSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 存储配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// 存储类型 (local, s3)
    pub storage_type: String,
    /// 本地存储路径 (当 type=local 时使用)
    pub local_path: Option<String>,
    /// S3 区域
    pub s3_region: Option<String>,
    /// S3 存储桶名称
    pub s3_bucket: Option<String>,
    /// S3 访问密钥
    pub s3_access_key: Option<String>,
    /// S3 密钥
    pub s3_secret_key: Option<String>,
    /// S3 端点 (可选，用于 MinIO 等兼容服务)
    pub s3_endpoint: Option<String>,
}

/// 浏览器配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserSettings {
    /// 出站请求使用的 User-Agent
    pub user_agent: String,
    /// 单个任务内并发打开的页面上限
    pub max_concurrent_pages: usize,
    /// 页面导航超时时间（秒）
    pub navigation_timeout_secs: u64,
    /// 自动滚动的最大迭代次数
    pub scroll_max_iterations: u32,
    /// 每次滚动后的稳定等待时间（毫秒）
    pub scroll_settle_ms: u64,
}

/// URL发现配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoverySettings {
    /// 链接爬取的最大深度
    pub max_depth: u32,
    /// 链接爬取的页面预算上限
    pub max_crawl_pages: usize,
    /// 抓取 sitemap 和页面时的请求超时（秒）
    pub fetch_timeout_secs: u64,
}

/// 工作器配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerSettings {
    /// 并行工作器数量
    pub count: usize,
    /// 队列为空时的轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 评估任务入队的最大重试次数
    pub dispatch_max_retries: u32,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default DB pool settings
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default Storage settings
            .set_default("storage.storage_type", "local")?
            .set_default("storage.local_path", "./storage")?
            // Default Browser settings
            .set_default(
                "browser.user_agent",
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36 pagewatch/0.1",
            )?
            .set_default("browser.max_concurrent_pages", 4)?
            .set_default("browser.navigation_timeout_secs", 30)?
            .set_default("browser.scroll_max_iterations", 20)?
            .set_default("browser.scroll_settle_ms", 500)?
            // Default Discovery settings
            .set_default("discovery.max_depth", 3)?
            .set_default("discovery.max_crawl_pages", 500)?
            .set_default("discovery.fetch_timeout_secs", 15)?
            // Default Worker settings
            .set_default("worker.count", 1)?
            .set_default("worker.poll_interval_secs", 2)?
            .set_default("worker.dispatch_max_retries", 5)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PAGEWATCH").separator("__"));

        builder.build()?.try_deserialize()
    }
}
