// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

mod error;
mod heuristic;
mod search;

pub use error::{SearchError, DEFAULT_YIELD_EVERY};
pub use heuristic::{Heuristic, StraightLine, ZeroHeuristic};
pub use search::{find_path, CancelToken, Search, SearchOptions, Status, Termination};
