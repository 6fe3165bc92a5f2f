// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface errors.

use thiserror::Error;

use crate::flush::PixelSize;

/// Errors raised by paint targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The pixel buffer for a backing store could not be allocated.
    #[error("cannot allocate a {}x{} pixel buffer", .0.width, .0.height)]
    Allocation(PixelSize),
}
