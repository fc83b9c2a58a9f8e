// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化URL用于去重
///
/// 规则：丢弃 fragment，去除默认端口（由 url crate 在解析时完成），
/// 折叠非根路径的尾部斜杠，查询串原样保留。
/// 两个仅查询参数顺序不同的URL被视为不同页面。
pub fn canonicalize(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    url.to_string()
}

/// 提取用于范围判断的频道主机名（去掉前导 www.）
pub fn channel_host(channel_url: &Url) -> Option<String> {
    let host = channel_url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// 判断链接是否属于频道域名范围
///
/// 链接主机与频道主机相同，或是其子域名时视为同域。
pub fn in_channel_scope(link: &Url, channel_host: &str) -> bool {
    match link.host_str() {
        Some(host) => {
            let host = host.strip_prefix("www.").unwrap_or(host);
            host == channel_host || host.ends_with(&format!(".{}", channel_host))
        }
        None => false,
    }
}
