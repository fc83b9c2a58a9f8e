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

use crate::utils::url_utils;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// 链接爬取错误类型
#[derive(Error, Debug)]
pub enum CrawlError {
    /// 频道根页面连接层不可达
    #[error("channel root unreachable: {0}")]
    RootUnreachable(String),

    /// 无效的频道URL
    #[error("invalid channel url: {0}")]
    InvalidChannelUrl(String),
}

/// 链接爬取器
///
/// 从频道根开始做广度优先遍历，收集同域链接。
/// 为保证合规覆盖的穷尽性，爬取刻意忽略 robots.txt
/// 及发布者声明的任何排除规则。
pub struct LinkCrawler {
    client: reqwest::Client,
    max_depth: u32,
    max_pages: usize,
}

impl LinkCrawler {
    /// 创建新的链接爬取器
    ///
    /// # 参数
    ///
    /// * `user_agent` - 出站请求使用的User-Agent
    /// * `fetch_timeout` - 单页抓取超时
    /// * `max_depth` - 最大遍历深度
    /// * `max_pages` - 页面预算上限
    pub fn new(
        user_agent: &str,
        fetch_timeout: Duration,
        max_depth: u32,
        max_pages: usize,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(fetch_timeout)
            .build()?;
        Ok(Self {
            client,
            max_depth,
            max_pages,
        })
    }

    /// 爬取频道的同域链接
    ///
    /// # 参数
    ///
    /// * `channel_url` - 频道根URL
    /// * `page_budget` - 额外的页面预算（取与配置上限的较小值）
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<String>)` - 按发现顺序排列的规范化URL（含根）
    /// * `Err(CrawlError)` - 根页面连接层不可达
    pub async fn crawl(
        &self,
        channel_url: &Url,
        page_budget: Option<usize>,
    ) -> Result<Vec<String>, CrawlError> {
        let scope_host = url_utils::channel_host(channel_url)
            .ok_or_else(|| CrawlError::InvalidChannelUrl(channel_url.to_string()))?;
        let budget = page_budget
            .map(|b| b.min(self.max_pages))
            .unwrap_or(self.max_pages);

        let root = url_utils::canonicalize(channel_url);
        let mut seen: HashSet<String> = HashSet::new();
        let mut discovered: Vec<String> = Vec::new();
        let mut frontier: VecDeque<(String, u32)> = VecDeque::new();

        seen.insert(root.clone());
        discovered.push(root.clone());
        frontier.push_back((root.clone(), 0));

        let mut fetched = 0usize;
        let mut root_fetch_error: Option<String> = None;

        while let Some((page_url, depth)) = frontier.pop_front() {
            if fetched >= budget {
                break;
            }
            fetched += 1;

            let body = match self.fetch_page(&page_url).await {
                Ok(Some(body)) => body,
                Ok(None) => {
                    debug!(url = %page_url, "non-success response, no links extracted");
                    continue;
                }
                Err(e) => {
                    if page_url == root {
                        root_fetch_error = Some(e.to_string());
                    } else {
                        warn!(url = %page_url, error = %e, "page fetch failed, skipping");
                    }
                    continue;
                }
            };

            if depth >= self.max_depth {
                continue;
            }

            for link in extract_links(&body, &page_url) {
                if !url_utils::in_channel_scope(&link, &scope_host) {
                    continue;
                }
                let canonical = url_utils::canonicalize(&link);
                if seen.insert(canonical.clone()) {
                    discovered.push(canonical.clone());
                    frontier.push_back((canonical, depth + 1));
                }
            }
        }

        // 只有根页面本身连接失败且一无所获时才算不可达
        if let Some(reason) = root_fetch_error {
            if discovered.len() <= 1 {
                return Err(CrawlError::RootUnreachable(reason));
            }
        }

        discovered.truncate(budget);
        debug!(count = discovered.len(), fetched, "link crawl finished");
        Ok(discovered)
    }

    /// 抓取单个页面，非2xx返回 `None`
    async fn fetch_page(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        Ok(Some(resp.text().await?))
    }
}

/// 从HTML内容中提取绝对链接
///
/// 跳过页内锚点、mailto 和 javascript 链接，只保留 http/https。
pub fn extract_links(html_content: &str, base_url: &str) -> Vec<Url> {
    let fragment = Html::parse_document(html_content);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let base = match Url::parse(base_url) {
        Ok(b) => b,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for element in fragment.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if href.starts_with('#') || href.starts_with("mailto:") || href.starts_with("javascript:")
            {
                continue;
            }

            if let Ok(url) = url_utils::resolve_url(&base, href) {
                if url.scheme() == "http" || url.scheme() == "https" {
                    links.push(url);
                }
            }
        }
    }

    links
}
