// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 捕获工作器模块
pub mod capture_worker;
/// 工作器管理模块
pub mod manager;
/// Worker trait定义模块
pub mod worker;
