// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 浏览器捕获引擎
pub mod browser_engine;

/// 页面上下文池
pub mod context_pool;

/// 引擎特质定义
pub mod traits;
