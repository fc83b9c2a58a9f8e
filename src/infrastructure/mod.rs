// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
pub mod cache;

/// 数据库模块
pub mod database;

/// 仓库实现模块
pub mod repositories;

/// 对象存储模块
pub mod storage;
