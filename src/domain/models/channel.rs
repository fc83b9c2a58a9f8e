// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 网站平台标识，频道查询仅针对此平台
pub const PLATFORM_WEBSITE: &str = "website";

/// 发布者频道
///
/// 发布者在某个平台上的存在，此处只关心 `website` 平台，
/// 以根URL标识。对捕获核心而言是外部协作方的数据，只读。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// 频道唯一标识符
    pub id: Uuid,
    /// 所属发布者ID
    pub publisher_id: Uuid,
    /// 平台标识
    pub platform: String,
    /// 频道根URL
    pub channel_url: String,
}
