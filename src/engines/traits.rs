// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::capture_result::CaptureResult;
use async_trait::async_trait;

/// 页面捕获引擎特质
///
/// 对单个URL执行一次完整捕获，产出不可变的捕获结果。
/// 浏览器实现之外还可注入替身实现用于流水线测试。
#[async_trait]
pub trait CaptureEngine: Send + Sync {
    /// 捕获单个URL的页面产物
    ///
    /// 失败不向上传播错误，而是产出带原因的失败结果，
    /// 由流水线计为跳过。
    async fn capture(&self, url: &str) -> CaptureResult;
}
