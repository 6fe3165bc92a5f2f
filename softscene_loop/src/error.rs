// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render loop errors.

use softscene_render::SurfaceError;
use thiserror::Error;

/// Errors surfaced by [`RenderLoop`](crate::RenderLoop) operations.
///
/// Operations on windows that are not tracked never fail; they are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoopError {
    /// A backing store could not be created or resized.
    #[error("backing store failure: {0}")]
    Surface(#[from] SurfaceError),
}
