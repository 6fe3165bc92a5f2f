// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree and display-list building for CPU scene rendering.
//!
//! `softscene_core` holds the data that flows through one frame of the
//! software render loop. It is `no_std` compatible (with `alloc`) and stores
//! the scene in struct-of-arrays layout with generational index handles.
//!
//! # Architecture
//!
//! Data flows one way per frame:
//!
//! ```text
//!   SceneTree (owned upstream)
//!       │
//!       ▼
//!   DisplayListBuilder::build() ──► DisplayList
//!                                       │
//!              ┌────────────────────────┘
//!              ▼
//!   Rasterizer (softscene_render) ──► pixels + FlushRegion
//!                                       │
//!              ┌────────────────────────┘
//!              ▼
//!   RenderLoop (softscene_loop) ──► present / capture
//! ```
//!
//! **[`scene`]**: Node tree with generational handles. Each node carries a
//! [`NodeKind`](scene::NodeKind) with its payload.
//!
//! **[`display`]**: Traversal state stack and the display-list builder that
//! linearizes a tree into painter's-order entries with resolved transform,
//! clip, and opacity.
//!
//! **[`transform`]**: 4×4 transform type used by transform nodes.
//!
//! **[`clip`]**: Clip shapes and clip intersection.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! per-frame instrumentation, with the [`Tracer`](trace::Tracer) wrapper.
//!
//! **[`time`]** and **[`window`]**: timestamps and window ids shared by the
//! loop and its observers.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates flush-rect and
//!   display-list statistics events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod clip;
pub mod display;
pub mod scene;
pub mod time;
pub mod trace;
pub mod transform;
pub mod window;
