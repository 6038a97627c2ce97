// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Configuration module for mcp-hub
//!
//! Handles loading and validating the backend map and hub tuning knobs.

pub mod settings;

pub use settings::*;
