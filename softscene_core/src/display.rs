// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-list building.
//!
//! [`DisplayListBuilder::build`] walks a [`SceneTree`] depth-first, pre-order,
//! from its root and linearizes it into a [`DisplayList`]: one
//! [`DisplayEntry`] per renderable node, in painter's order, each carrying
//! the transform, clip, and opacity resolved from its ancestors.
//!
//! # Traversal state
//!
//! The builder keeps a stack of [`TraversalFrame`]s. Transform, clip, and
//! opacity nodes push a frame derived from the one below it and pop it once
//! their subtree is finished, so siblings never observe each other's state.
//! The stack is seeded with [`TraversalFrame::IDENTITY`] and is back at depth
//! zero when `build` returns, whether or not subtrees were pruned.
//!
//! # Dispatch
//!
//! | Kind | Effect |
//! |---|---|
//! | `Root` | nothing; children visited in order |
//! | `Transform` | pushes `parent * local` |
//! | `Clip` | pushes the device-space intersection; skips the subtree if empty |
//! | `Opacity` | pushes `parent * clamp(local, 0, 1)`; zero still traverses |
//! | renderable | emits one entry, then visits children |
//! | `Unknown` / malformed | no-op leaf: no entry, no push, children skipped |

use alloc::vec::Vec;

use kurbo::Rect;

use crate::clip::intersect_clip;
use crate::scene::{NodeId, NodeKind, Payload, SceneTree};
use crate::transform::Transform3d;

/// Inherited rendering state at one point of a traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraversalFrame {
    /// Composition of all ancestor transforms.
    pub transform: Transform3d,
    /// Intersection of all ancestor clips in device space; `None` is
    /// unclipped.
    ///
    /// Each clip is mapped through the transform in effect at its node, so a
    /// clip below a non-identity transform does not equal its local shape:
    /// a `Clip(c)` under `Transform(t)` resolves to the bounding box of
    /// `t(c)`.
    pub clip: Option<Rect>,
    /// Product of all ancestor opacities, in `[0, 1]`.
    pub opacity: f32,
}

impl TraversalFrame {
    /// The state at the root: identity transform, no clip, fully opaque.
    pub const IDENTITY: Self = Self {
        transform: Transform3d::IDENTITY,
        clip: None,
        opacity: 1.0,
    };
}

impl Default for TraversalFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One render-ready command: a payload with its resolved state.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayEntry {
    /// The scene node this entry was produced from.
    pub node: NodeId,
    /// What to draw.
    pub payload: Payload,
    /// Local-to-device transform.
    pub transform: Transform3d,
    /// Device-space clip, if any.
    pub clip: Option<Rect>,
    /// Effective opacity.
    pub opacity: f32,
}

impl DisplayEntry {
    /// Device-space bounds of the payload after transform and clip.
    ///
    /// Returns `None` if the payload has no intrinsic bounds or is clipped
    /// away entirely.
    #[must_use]
    pub fn device_bounds(&self) -> Option<Rect> {
        let local = self.payload.local_bounds()?;
        let device = self.transform.map_rect_bounds(local);
        match self.clip {
            Some(clip) => intersect_clip(Some(clip), device),
            None => Some(device),
        }
    }
}

/// An ordered sequence of [`DisplayEntry`]s.
///
/// Later entries paint over earlier ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    entries: Vec<DisplayEntry>,
}

impl DisplayList {
    /// Creates an empty display list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The entries, in paint order.
    #[must_use]
    pub fn entries(&self) -> &[DisplayEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates entries in paint order.
    pub fn iter(&self) -> core::slice::Iter<'_, DisplayEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a DisplayList {
    type Item = &'a DisplayEntry;
    type IntoIter = core::slice::Iter<'a, DisplayEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Counters for one [`DisplayListBuilder::build`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Nodes visited, including malformed ones.
    pub visited: u32,
    /// Entries emitted.
    pub emitted: u32,
    /// Clip nodes whose subtree was skipped because the clip was empty.
    pub pruned: u32,
    /// Malformed or unknown nodes treated as no-op leaves.
    pub malformed: u32,
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Visit(NodeId),
    Pop,
}

/// Walks a scene tree and produces a [`DisplayList`].
///
/// The builder owns its traversal stack and scratch space so repeated builds
/// reuse allocations.
#[derive(Debug, Default)]
pub struct DisplayListBuilder {
    stack: Vec<TraversalFrame>,
    work: Vec<Step>,
}

impl DisplayListBuilder {
    /// Creates a builder with an empty state stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stack: Vec::new(),
            work: Vec::new(),
        }
    }

    /// Current depth of the traversal stack. Zero outside of [`build`](Self::build).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Replaces the contents of `list` with the display list for `tree`.
    ///
    /// A tree without a root produces an empty list.
    pub fn build(&mut self, tree: &SceneTree, list: &mut DisplayList) -> BuildStats {
        list.clear();
        let mut stats = BuildStats::default();
        let Some(root) = tree.root() else {
            return stats;
        };

        let base = self.stack.len();
        self.work.clear();
        self.work.push(Step::Visit(root));

        while let Some(step) = self.work.pop() {
            match step {
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Visit(id) => {
                    stats.visited += 1;
                    if self.enter(tree, id, list, &mut stats) {
                        let start = self.work.len();
                        self.work.extend(tree.children(id).map(Step::Visit));
                        self.work[start..].reverse();
                    }
                }
            }
        }

        debug_assert_eq!(self.stack.len(), base, "unbalanced traversal stack");
        log::trace!(
            target: "softscene::display_list",
            "built display list: visited={} emitted={} pruned={} malformed={}",
            stats.visited,
            stats.emitted,
            stats.pruned,
            stats.malformed,
        );
        stats
    }

    fn top(&self) -> TraversalFrame {
        self.stack.last().copied().unwrap_or(TraversalFrame::IDENTITY)
    }

    /// Applies the node's effect and reports whether its children should be
    /// visited. A pushed frame is paired with a [`Step::Pop`] scheduled after
    /// the children.
    fn enter(
        &mut self,
        tree: &SceneTree,
        id: NodeId,
        list: &mut DisplayList,
        stats: &mut BuildStats,
    ) -> bool {
        let top = self.top();
        let kind = tree.kind(id);
        let pushed = match kind {
            NodeKind::Root => None,
            NodeKind::Transform(local) => {
                if !local.is_finite() {
                    return malformed(id, kind, stats);
                }
                Some(TraversalFrame {
                    transform: top.transform * *local,
                    ..top
                })
            }
            NodeKind::Clip(shape) => {
                if !shape.is_well_formed() {
                    return malformed(id, kind, stats);
                }
                let Some(clip) = intersect_clip(top.clip, shape.device_bounds(top.transform))
                else {
                    stats.pruned += 1;
                    return false;
                };
                Some(TraversalFrame {
                    clip: Some(clip),
                    ..top
                })
            }
            NodeKind::Opacity(local) => {
                if local.is_nan() {
                    return malformed(id, kind, stats);
                }
                Some(TraversalFrame {
                    opacity: top.opacity * local.clamp(0.0, 1.0),
                    ..top
                })
            }
            NodeKind::Unknown(_) => return malformed(id, kind, stats),
            _ => {
                let Some(payload) = kind.payload().filter(Payload::is_well_formed) else {
                    return malformed(id, kind, stats);
                };
                list.entries.push(DisplayEntry {
                    node: id,
                    payload,
                    transform: top.transform,
                    clip: top.clip,
                    opacity: top.opacity,
                });
                stats.emitted += 1;
                None
            }
        };

        if let Some(frame) = pushed {
            self.stack.push(frame);
            self.work.push(Step::Pop);
        }
        true
    }
}

fn malformed(id: NodeId, kind: &NodeKind, stats: &mut BuildStats) -> bool {
    log::trace!(target: "softscene::display_list", "skipping malformed node {id:?}: {kind:?}");
    stats.malformed += 1;
    false
}
