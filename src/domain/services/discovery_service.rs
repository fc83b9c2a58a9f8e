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

use crate::config::settings::{BrowserSettings, DiscoverySettings};
use crate::domain::services::link_crawler::LinkCrawler;
use crate::domain::services::sitemap_resolver::SitemapResolver;
use crate::utils::url_utils;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// URL发现错误类型
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// 频道根完全不可达，任务级失败
    #[error("channel unreachable: {0}")]
    Unreachable(String),

    /// 无效的频道URL
    #[error("invalid channel url: {0}")]
    InvalidChannelUrl(String),
}

/// URL发现引擎
///
/// 合并 sitemap 解析与链接爬取的结果，产出去重且封顶的有序URL集。
/// sitemap 来源排在前面，使捕获顺序偏向发布者声明的规范页面。
pub struct DiscoveryService {
    sitemap: SitemapResolver,
    crawler: LinkCrawler,
}

impl DiscoveryService {
    /// 组合自定义的解析器与爬取器
    pub fn new(sitemap: SitemapResolver, crawler: LinkCrawler) -> Self {
        Self { sitemap, crawler }
    }

    /// 根据配置创建发现引擎
    pub fn from_settings(
        browser: &BrowserSettings,
        discovery: &DiscoverySettings,
    ) -> anyhow::Result<Self> {
        let fetch_timeout = Duration::from_secs(discovery.fetch_timeout_secs);
        let sitemap = SitemapResolver::new(&browser.user_agent, fetch_timeout)?;
        let crawler = LinkCrawler::new(
            &browser.user_agent,
            fetch_timeout,
            discovery.max_depth,
            discovery.max_crawl_pages,
        )?;
        Ok(Self::new(sitemap, crawler))
    }

    /// 发现频道的全部可捕获URL
    ///
    /// # 参数
    ///
    /// * `channel_url` - 频道根URL
    /// * `max_pages` - URL总数上限（缺省不限制）
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<String>)` - 去重后的有序URL集，sitemap优先
    /// * `Err(DiscoveryError)` - 两条发现路径都无法到达频道根
    pub async fn discover(
        &self,
        channel_url: &str,
        max_pages: Option<u64>,
    ) -> Result<Vec<String>, DiscoveryError> {
        let root = Url::parse(channel_url)
            .map_err(|e| DiscoveryError::InvalidChannelUrl(format!("{}: {}", channel_url, e)))?;
        let scope_host = url_utils::channel_host(&root)
            .ok_or_else(|| DiscoveryError::InvalidChannelUrl(format!("{}: no host", channel_url)))?;

        let sitemap_result = self.sitemap.resolve(&root).await;
        let crawl_budget = max_pages.map(|m| m as usize);
        let crawl_result = self.crawler.crawl(&root, crawl_budget).await;

        let (sitemap_urls, crawl_urls) = match (sitemap_result, crawl_result) {
            (Err(se), Err(ce)) => {
                return Err(DiscoveryError::Unreachable(format!(
                    "sitemap: {}; crawl: {}",
                    se, ce
                )));
            }
            (Ok(s), Err(ce)) => {
                warn!(error = %ce, "link crawl unreachable, sitemap results only");
                (s, Vec::new())
            }
            (Err(se), Ok(c)) => {
                warn!(error = %se, "sitemap unreachable, crawl results only");
                (Vec::new(), c)
            }
            (Ok(s), Ok(c)) => (s, c),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut merged: Vec<String> = Vec::new();

        // sitemap 条目先入，保证其在截断时优先保留；
        // 域归属与爬取路径同规则，站外 <loc> 条目（CDN等）不进捕获集
        for raw in sitemap_urls {
            let parsed = match Url::parse(&raw) {
                Ok(u) if u.scheme() == "http" || u.scheme() == "https" => u,
                _ => {
                    warn!(url = %raw, "sitemap entry is not a valid http url, dropped");
                    continue;
                }
            };
            if !url_utils::in_channel_scope(&parsed, &scope_host) {
                warn!(url = %raw, "sitemap entry outside channel domain, dropped");
                continue;
            }
            let canonical = url_utils::canonicalize(&parsed);
            if seen.insert(canonical.clone()) {
                merged.push(canonical);
            }
        }

        for canonical in crawl_urls {
            if seen.insert(canonical.clone()) {
                merged.push(canonical);
            }
        }

        if let Some(cap) = max_pages {
            merged.truncate(cap as usize);
        }

        info!(count = merged.len(), channel = %channel_url, "url discovery complete");
        Ok(merged)
    }
}
