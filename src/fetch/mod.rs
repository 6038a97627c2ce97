// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Resource and prompt managers
//!
//! Fan out to every backend, tolerate partial failure, and flatten what comes
//! back into text the assistant can read.

pub mod prompts;
pub mod resources;

pub use prompts::*;
pub use resources::*;
