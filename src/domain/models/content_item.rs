// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 内容条目
///
/// 代表一个成功捕获的页面的逻辑记录，拥有两个内容文件
/// （HTML快照与截图）。只为成功的捕获创建，创建后不再变更。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// 条目唯一标识符
    pub id: Uuid,
    /// 所属发布者ID
    pub publisher_id: Uuid,
    /// 所属扫描任务ID
    pub scan_job_id: Uuid,
    /// 页面URL
    pub url: String,
    /// 捕获时间
    pub captured_at: DateTime<FixedOffset>,
}

/// 内容文件
///
/// 内容条目拥有的单个产物记录，携带存储路径与SHA-256摘要。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFile {
    /// 文件唯一标识符
    pub id: Uuid,
    /// 所属内容条目ID
    pub content_item_id: Uuid,
    /// 文件类型
    pub file_type: FileType,
    /// 对象存储中的路径
    pub file_path: String,
    /// 文件内容的SHA-256摘要（十六进制）
    pub sha256: String,
}

/// 内容文件类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// HTML快照
    Html,
    /// 整页截图
    Screenshot,
}

/// 文件类型解析错误
#[derive(Error, Debug)]
#[error("未知的文件类型: {0}")]
pub struct ParseFileTypeError(String);

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Html => write!(f, "html"),
            FileType::Screenshot => write!(f, "screenshot"),
        }
    }
}

impl FromStr for FileType {
    type Err = ParseFileTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(FileType::Html),
            "screenshot" => Ok(FileType::Screenshot),
            other => Err(ParseFileTypeError(other.to_string())),
        }
    }
}
