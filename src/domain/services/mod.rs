// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 内容寻址与持久化服务
pub mod content_service;

/// URL发现引擎
pub mod discovery_service;

/// 链接爬取器
pub mod link_crawler;

/// Sitemap解析器
pub mod sitemap_resolver;
