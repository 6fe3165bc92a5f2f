// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree data model.
//!
//! A *node* is an element of one window's scene. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//!   Sibling order is paint order; earlier siblings are painted first.
//! - A [`NodeKind`] carrying the kind-specific payload. Structural kinds
//!   (transform, clip, opacity) modify the state inherited by their subtree;
//!   renderable kinds produce one display-list entry each.
//!
//! The tree is owned by the embedder's scene-graph owner and is only read
//! during the render phase.

mod id;
mod node;
mod traverse;
mod tree;

pub use id::{INVALID, NodeId, ResourceKey};
pub use node::{
    Color, CustomPaintContent, GeometryContent, GeometryMode, Glyph, GlyphRunContent,
    ImageContent, NinePatchContent, NodeKind, Payload, RectangleContent, STROKE_MITER_LIMIT,
};
pub use traverse::Children;
pub use tree::SceneTree;
