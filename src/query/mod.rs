// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only queries over flow graphs.
//!
//! Reachability backs the cycle check; connectivity backs the save gate; degrees and terminals
//! feed the TUI inspector and MCP stats.

pub mod flow;

pub use flow::{is_fully_connected, reaches, unconnected_nodes};
