// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render loop configuration.

use softscene_core::scene::Color;

/// Environment variable that enables per-frame timing logs when set to `1`
/// or `true`.
pub const PROFILE_FRAMES_ENV: &str = "SOFTSCENE_PROFILE_FRAMES";

/// Tunables for a [`RenderLoop`](crate::RenderLoop).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderLoopConfig {
    /// Log per-frame phase timings at debug level even when the
    /// `softscene::render_loop` log target is not enabled for debug.
    pub profile_frames: bool,
    /// Color the backing store is cleared to before each frame.
    pub clear_color: Color,
}

impl RenderLoopConfig {
    /// Profiling off, white background.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profile_frames: false,
            clear_color: Color::WHITE,
        }
    }

    /// Defaults, with `profile_frames` taken from
    /// [`SOFTSCENE_PROFILE_FRAMES`](PROFILE_FRAMES_ENV).
    #[must_use]
    pub fn from_env() -> Self {
        let profile_frames = std::env::var(PROFILE_FRAMES_ENV)
            .ok()
            .is_some_and(|v| parse_flag(&v));
        Self {
            profile_frames,
            ..Self::new()
        }
    }

    /// Sets [`profile_frames`](Self::profile_frames).
    #[must_use]
    pub const fn with_profile_frames(mut self, profile_frames: bool) -> Self {
        self.profile_frames = profile_frames;
        self
    }

    /// Sets [`clear_color`](Self::clear_color).
    #[must_use]
    pub const fn with_clear_color(mut self, clear_color: Color) -> Self {
        self.clear_color = clear_color;
        self
    }
}

impl Default for RenderLoopConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
