// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 单个页面的捕获产物
///
/// 导航、自动滚动完成后得到的完整 DOM HTML 与整页截图。
#[derive(Debug, Clone)]
pub struct PageArtifacts {
    /// HTML快照字节
    pub html: Vec<u8>,
    /// 整页截图字节（PNG）
    pub screenshot: Vec<u8>,
}

/// 单个URL的捕获结果
///
/// 每个URL由编排器产出一次，创建后不可变：
/// 要么完整（两个产物齐备），要么失败（携带原因、无产物）。
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// 页面URL
    pub url: String,
    /// 捕获结果
    pub outcome: CaptureOutcome,
}

/// 捕获结果枚举
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// 捕获成功，持有两个产物
    Captured(PageArtifacts),
    /// 捕获失败，记录原因
    Failed(String),
}

impl CaptureResult {
    pub fn captured(url: impl Into<String>, html: Vec<u8>, screenshot: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            outcome: CaptureOutcome::Captured(PageArtifacts { html, screenshot }),
        }
    }

    pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: CaptureOutcome::Failed(reason.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, CaptureOutcome::Captured(_))
    }
}

/// 一次捕获任务的汇总
///
/// 任务完成后上报的成功/跳过计数。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSummary {
    /// 发现的URL总数
    pub discovered: usize,
    /// 成功捕获并持久化的URL数
    pub captured: usize,
    /// 被跳过的URL数（捕获失败或持久化失败）
    pub skipped: usize,
}
