// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 频道仓库实现
pub mod channel_repo_impl;

/// 内容仓库实现
pub mod content_repo_impl;
