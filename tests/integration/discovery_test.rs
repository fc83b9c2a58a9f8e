// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! URL发现引擎集成测试
//!
//! 用 wiremock 模拟发布者网站，验证 sitemap 解析与
//! 链接爬取的合并、去重、封顶与降级行为。

use pagewatch::domain::services::discovery_service::{DiscoveryError, DiscoveryService};
use pagewatch::domain::services::link_crawler::LinkCrawler;
use pagewatch::domain::services::sitemap_resolver::SitemapResolver;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UA: &str = "pagewatch-test/0.1";

fn build_service() -> DiscoveryService {
    let timeout = Duration::from_secs(5);
    let sitemap = SitemapResolver::new(UA, timeout).unwrap();
    let crawler = LinkCrawler::new(UA, timeout, 3, 100).unwrap();
    DiscoveryService::new(sitemap, crawler)
}

fn urlset(entries: &[String]) -> String {
    let body: String = entries
        .iter()
        .map(|u| format!("<url><loc>{}</loc></url>", u))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        body
    )
}

/// sitemap 与爬取结果合并去重，sitemap 条目在前
#[tokio::test]
async fn test_discovery_merges_sitemap_and_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap_entries = vec![
        format!("{}/", base),
        format!("{}/a", base),
        format!("{}/b", base),
        format!("{}/c", base),
        format!("{}/d", base),
    ];
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&sitemap_entries)))
        .mount(&server)
        .await;

    // 根页面链接到一个 sitemap 里已有的页面和一个爬取独有的页面
    let root_html = r#"<html><body>
        <a href="/a">A</a>
        <a href="/crawl-only">Only via crawl</a>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root_html))
        .mount(&server)
        .await;

    let service = build_service();
    let urls = service.discover(&format!("{}/", base), None).await.unwrap();

    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base),
            format!("{}/c", base),
            format!("{}/d", base),
            format!("{}/crawl-only", base),
        ]
    );
}

/// 站外域名的 sitemap `<loc>` 条目（CDN等）不进入捕获集，
/// 与爬取路径的同域过滤规则一致
#[tokio::test]
async fn test_discovery_drops_off_domain_sitemap_entries() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap_entries = vec![
        format!("{}/article", base),
        "https://cdn.elsewhere.example/asset-page".to_string(),
        format!("{}/about", base),
    ];
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&sitemap_entries)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let service = build_service();
    let urls = service.discover(&format!("{}/", base), None).await.unwrap();

    assert_eq!(
        urls,
        vec![
            format!("{}/article", base),
            format!("{}/about", base),
            format!("{}/", base),
        ]
    );
}

/// sitemap 索引（5+3）加一个爬取独有URL共9个唯一URL；
/// 子 sitemap 按索引声明顺序展开，maxPages=4 时只保留前4个条目
#[tokio::test]
async fn test_discovery_sitemap_index_with_crawl_supplement() {
    let server = MockServer::start().await;
    let base = server.uri();

    let index = format!(
        r#"<sitemapindex>
            <sitemap><loc>{}/sitemap-posts.xml</loc></sitemap>
            <sitemap><loc>{}/sitemap-pages.xml</loc></sitemap>
        </sitemapindex>"#,
        base, base
    );
    let posts: Vec<String> = (1..=5).map(|i| format!("{}/post/{}", base, i)).collect();
    let pages: Vec<String> = (1..=3).map(|i| format!("{}/page/{}", base, i)).collect();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-posts.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&posts)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-pages.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&pages)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><body><a href="/extra">extra</a></body></html>"#),
        )
        .mount(&server)
        .await;

    let service = build_service();

    // 不限量：8个 sitemap URL（posts 在前，按索引声明顺序）+ 根 + 爬取独有URL
    let urls = service.discover(&format!("{}/", base), None).await.unwrap();
    let mut expected: Vec<String> = posts.clone();
    expected.extend(pages.clone());
    expected.push(format!("{}/", base));
    expected.push(format!("{}/extra", base));
    assert_eq!(urls, expected);

    // 封顶为4：保留第一个子 sitemap 的前4个条目
    let capped = service
        .discover(&format!("{}/", base), Some(4))
        .await
        .unwrap();
    assert_eq!(capped, posts[..4].to_vec());
}

/// max_pages 截断时 sitemap 来源优先保留
#[tokio::test]
async fn test_discovery_cap_prefers_sitemap_entries() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap_entries = vec![
        format!("{}/", base),
        format!("{}/a", base),
        format!("{}/b", base),
        format!("{}/c", base),
    ];
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&sitemap_entries)))
        .mount(&server)
        .await;

    let root_html = r#"<html><body><a href="/crawl-only">X</a></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root_html))
        .mount(&server)
        .await;

    let service = build_service();
    let urls = service
        .discover(&format!("{}/", base), Some(3))
        .await
        .unwrap();

    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base),
        ]
    );
}

/// sitemap 缺失（404）时退回纯爬取结果
#[tokio::test]
async fn test_discovery_falls_back_to_crawl_without_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();

    // 不挂载 /sitemap.xml，默认返回404
    let root_html = r#"<html><body>
        <a href="/a">A</a>
        <a href="/b">B</a>
        <a href="https://elsewhere.example/out">external</a>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root_html))
        .mount(&server)
        .await;

    let service = build_service();
    let urls = service.discover(&format!("{}/", base), None).await.unwrap();

    // 根自身也计入发现集，外部域被过滤
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base),
        ]
    );
}

/// 相互引用的 sitemap 索引不会导致无限循环
#[tokio::test]
async fn test_discovery_terminates_on_sitemap_cycle() {
    let server = MockServer::start().await;
    let base = server.uri();

    let index_root = format!(
        r#"<sitemapindex><sitemap><loc>{}/sitemap-a.xml</loc></sitemap></sitemapindex>"#,
        base
    );
    // 子 sitemap 指回根 sitemap 形成环，同时带一个页面条目
    let index_child = format!(
        r#"<sitemapindex>
            <sitemap><loc>{}/sitemap.xml</loc></sitemap>
            <url><loc>{}/page</loc></url>
        </sitemapindex>"#,
        base, base
    );

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_root))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-a.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_child))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let service = build_service();
    let urls = service.discover(&format!("{}/", base), None).await.unwrap();

    assert!(urls.contains(&format!("{}/page", base)));
}

/// 两条发现路径都连接失败时上报任务级不可达
#[tokio::test]
async fn test_discovery_unreachable_channel() {
    // 绑定后立刻释放端口，保证连接被拒绝
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let service = build_service();
    let result = service
        .discover(&format!("http://127.0.0.1:{}/", port), None)
        .await;

    assert!(matches!(result, Err(DiscoveryError::Unreachable(_))));
}

/// 无效的频道URL直接报错
#[tokio::test]
async fn test_discovery_invalid_channel_url() {
    let service = build_service();
    let result = service.discover("not a url", None).await;
    assert!(matches!(result, Err(DiscoveryError::InvalidChannelUrl(_))));
}
