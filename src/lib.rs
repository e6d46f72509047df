// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flowdeck: a flow-graph editor core with a TUI and an MCP surface.
//!
//! Steps (message nodes) are joined by directed connections. The core keeps the flow acyclic,
//! allows one connection per source output, and only lets a flow be saved when every step is
//! connected.

pub mod config;
pub mod editor;
pub mod logging;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod query;
pub mod store;
pub mod tui;
