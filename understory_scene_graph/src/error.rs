// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned by structural mutation and coordinate conversion.

use crate::types::NodeId;

/// Convenience result type used across the scene graph.
pub type Result<T, E = GraphError> = core::result::Result<T, E>;

/// Errors raised at the API boundary. A failed call leaves the graph unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A handle was stale or an argument made no sense for the call.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong.
        reason: &'static str,
    },

    /// A child index was outside the valid range.
    #[error("index {index} out of range for {len} children")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// Number of children at the time of the call.
        len: usize,
    },

    /// The node is not a child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The container that was searched.
        parent: NodeId,
        /// The node that was expected in its child list.
        child: NodeId,
    },

    /// Attaching would make a node its own ancestor.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// The prospective parent.
        parent: NodeId,
        /// The prospective child, an ancestor of `parent`.
        child: NodeId,
    },

    /// A world transform could not be inverted.
    #[error("world transform of {0:?} is not invertible")]
    NonInvertible(NodeId),
}

impl GraphError {
    pub(crate) const fn invalid(reason: &'static str) -> Self {
        Self::InvalidArgument { reason }
    }
}
