// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 捕获任务模型
pub mod capture_job;

/// 捕获结果模型
pub mod capture_result;

/// 发布者频道模型
pub mod channel;

/// 内容条目模型
pub mod content_item;
