// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 频道仓库接口
pub mod channel_repository;

/// 内容仓库接口
pub mod content_repository;

/// 存储仓库接口
pub mod storage_repository;
