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

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Sitemap解析错误类型
#[derive(Error, Debug)]
pub enum SitemapError {
    /// 根sitemap所在主机完全不可达（连接层失败）
    #[error("sitemap host unreachable: {0}")]
    Unreachable(String),
}

/// 一份sitemap文档的解析结果
///
/// `<urlset>` 文档产出页面URL，`<sitemapindex>` 文档产出子sitemap。
/// 同一份文档两类条目可以并存（宽松处理畸形文档）。
#[derive(Debug, Default)]
struct SitemapDocument {
    page_urls: Vec<String>,
    child_sitemaps: Vec<String>,
}

/// Sitemap解析器
///
/// 抓取频道根下的 sitemap.xml，递归展开 sitemap 索引，
/// 产出候选页面URL集合。sitemap 缺失属于预期情况，返回空集。
pub struct SitemapResolver {
    client: reqwest::Client,
}

impl SitemapResolver {
    /// 创建新的Sitemap解析器
    pub fn new(user_agent: &str, fetch_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(fetch_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// 解析频道的sitemap树
    ///
    /// # 参数
    ///
    /// * `channel_url` - 频道根URL
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<String>)` - 按文档顺序排列的候选URL，可能为空
    /// * `Err(SitemapError)` - 仅当根主机连接层不可达时
    pub async fn resolve(&self, channel_url: &Url) -> Result<Vec<String>, SitemapError> {
        let root_sitemap = match channel_url.join("/sitemap.xml") {
            Ok(u) => u,
            Err(e) => return Err(SitemapError::Unreachable(e.to_string())),
        };

        let body = match self.fetch(&root_sitemap).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                // sitemap 缺失是预期情况，交由链接爬取兜底
                warn!(url = %root_sitemap, "sitemap missing or not ok, returning empty set");
                return Ok(Vec::new());
            }
            // 根抓取连接失败上报给发现引擎判定整体可达性
            Err(e) => return Err(SitemapError::Unreachable(e.to_string())),
        };

        let mut urls = Vec::new();
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut visited_sitemaps: HashSet<String> = HashSet::new();
        visited_sitemaps.insert(root_sitemap.to_string());

        // 显式工作队列展开索引，保持索引声明顺序，visited 集合防环
        let mut pending: VecDeque<String> = match parse_sitemap(&body) {
            Ok(doc) => {
                Self::collect_pages(doc.page_urls, &mut urls, &mut seen_urls);
                doc.child_sitemaps.into()
            }
            Err(e) => {
                warn!(url = %root_sitemap, error = %e, "malformed sitemap, returning empty set");
                return Ok(Vec::new());
            }
        };

        while let Some(child) = pending.pop_front() {
            if !visited_sitemaps.insert(child.clone()) {
                debug!(url = %child, "sitemap already visited, skipping");
                continue;
            }

            let child_url = match Url::parse(&child) {
                Ok(u) => u,
                Err(e) => {
                    warn!(url = %child, error = %e, "invalid child sitemap url");
                    continue;
                }
            };

            match self.fetch(&child_url).await {
                Ok(Some(body)) => match parse_sitemap(&body) {
                    Ok(doc) => {
                        Self::collect_pages(doc.page_urls, &mut urls, &mut seen_urls);
                        pending.extend(doc.child_sitemaps);
                    }
                    Err(e) => warn!(url = %child, error = %e, "malformed child sitemap"),
                },
                Ok(None) => warn!(url = %child, "child sitemap missing"),
                Err(e) => warn!(url = %child, error = %e, "child sitemap fetch failed"),
            }
        }

        debug!(count = urls.len(), "sitemap resolution finished");
        Ok(urls)
    }

    fn collect_pages(pages: Vec<String>, urls: &mut Vec<String>, seen: &mut HashSet<String>) {
        for page in pages {
            if seen.insert(page.clone()) {
                urls.push(page);
            }
        }
    }

    /// 抓取一份sitemap文档
    ///
    /// 非2xx状态返回 `None`，连接层错误返回 `Err`。
    async fn fetch(&self, url: &Url) -> Result<Option<String>, reqwest::Error> {
        let resp = self.client.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        Ok(Some(resp.text().await?))
    }
}

/// 解析一份sitemap XML文档
///
/// 同时识别 `<urlset>` 的 `<url><loc>` 条目与
/// `<sitemapindex>` 的 `<sitemap><loc>` 条目。
fn parse_sitemap(xml: &str) -> anyhow::Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut doc = SitemapDocument::default();
    let mut in_url = false;
    let mut in_sitemap = false;
    let mut in_loc = false;
    let mut current_loc = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                match e.local_name().as_ref() {
                    b"url" => {
                        in_url = true;
                        current_loc.clear();
                    }
                    b"sitemap" => {
                        in_sitemap = true;
                        current_loc.clear();
                    }
                    b"loc" => in_loc = true,
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if in_loc && (in_url || in_sitemap) {
                    current_loc.push_str(t.unescape()?.trim());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"url" if in_url => {
                    if !current_loc.is_empty() {
                        doc.page_urls.push(current_loc.clone());
                    }
                    in_url = false;
                }
                b"sitemap" if in_sitemap => {
                    if !current_loc.is_empty() {
                        doc.child_sitemaps.push(current_loc.clone());
                    }
                    in_sitemap = false;
                }
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow::anyhow!("sitemap parse error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}
