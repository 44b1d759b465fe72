// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

/// Recommended number of iterations a [Search](crate::Search) runs in one
/// [resume](crate::Search::resume) call before handing control back to the caller.
pub const DEFAULT_YIELD_EVERY: usize = 64;

/// Error conditions which may occur when starting a [Search](crate::Search)
/// or a [Wavefront](crate::Wavefront).
///
/// Not finding a path is not an error - see [Status::Exhausted](crate::Status::Exhausted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The graph has not been completely built yet.
    #[error("graph not ready: building has not completed")]
    NotInitialized,

    /// The start or end node doesn't exist in the graph.
    #[error("unknown node: {0}")]
    UnknownNode(i64),
}
