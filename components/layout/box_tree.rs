/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The frozen tree of positioned boxes handed over by layout.
//!
//! Boxes live in an arena and are addressed by [`BoxId`]. The tree is assembled
//! by a single writer through [`BoxTreeBuilder`] and is validated once, when it
//! is built, so that the paint order builder and the hit tester can walk it
//! without re-checking parent and child links.

use std::fmt;

use bitflags::bitflags;
use log::debug;
use smallvec::SmallVec;

use crate::error::{InvalidTreeReason, LayoutError};
use crate::flow_registry::FlowId;
use crate::geom::PhysicalRect;

/// Index of a box in its [`BoxTree`]. Never reused while the tree is live.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BoxId(pub usize);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An opaque handle on the DOM element that generated a box.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ElementId(pub usize);

/// The used value of the `position` property.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    pub fn is_positioned(self) -> bool {
        self != Position::Static
    }
}

bitflags! {
    /// Style bits that matter for painting and hit testing but not for ordering.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct BoxFlags: u8 {
        /// `pointer-events: none`. The box paints but is never a hit target.
        const POINTER_EVENTS_NONE = 1 << 0;
        /// `visibility: hidden`. The box neither paints nor hits, its
        /// descendants are unaffected.
        const VISIBILITY_HIDDEN = 1 << 1;
    }
}

/// Where the content painted inside a box comes from.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum BoxContent {
    /// The box paints its own element's content.
    #[default]
    Normal,
    /// The box is a CSS region (`flow-from: <flow>`) and displays a fragment
    /// of that named flow.
    RegionConsumer { flow: FlowId },
}

/// The subset of computed style that positions a box in paint order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BoxStyle {
    pub position: Position,
    pub z_index: Option<i32>,
    pub flags: BoxFlags,
}

impl BoxStyle {
    pub fn positioned(position: Position, z_index: Option<i32>) -> Self {
        Self {
            position,
            z_index,
            flags: BoxFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: BoxFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// The z-index that actually applies. `z-index` has no effect on
    /// non-positioned boxes.
    pub fn effective_z_index(&self) -> Option<i32> {
        if self.position.is_positioned() {
            self.z_index
        } else {
            None
        }
    }

    pub fn establishes_stacking_context(&self) -> bool {
        self.effective_z_index().is_some()
    }
}

#[derive(Clone, Debug)]
pub struct LayoutBox {
    /// The element this box was generated for.
    pub element: ElementId,

    /// The border box, in viewport coordinates.
    pub rect: PhysicalRect,

    pub style: BoxStyle,

    pub content: BoxContent,

    parent: Option<BoxId>,
    children: SmallVec<[BoxId; 4]>,
}

impl LayoutBox {
    pub fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    pub fn children(&self) -> &[BoxId] {
        &self.children
    }

    pub fn is_region(&self) -> bool {
        matches!(self.content, BoxContent::RegionConsumer { .. })
    }
}

/// An immutable, validated tree of boxes.
#[derive(Clone, Debug)]
pub struct BoxTree {
    boxes: Vec<LayoutBox>,
    root: BoxId,
}

impl BoxTree {
    pub fn root(&self) -> BoxId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn contains(&self, id: BoxId) -> bool {
        id.0 < self.boxes.len()
    }

    pub fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.0)
    }

    /// Every id stored in the tree was checked by [`BoxTreeBuilder::build`],
    /// so ids obtained from the tree itself always index successfully.
    pub(crate) fn node(&self, id: BoxId) -> &LayoutBox {
        &self.boxes[id.0]
    }

    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map(LayoutBox::children).unwrap_or_default()
    }

    pub fn parent(&self, id: BoxId) -> Option<BoxId> {
        self.get(id).and_then(LayoutBox::parent)
    }

    pub fn rect(&self, id: BoxId) -> Option<PhysicalRect> {
        self.get(id).map(|layout_box| layout_box.rect)
    }

    pub fn position(&self, id: BoxId) -> Option<Position> {
        self.get(id).map(|layout_box| layout_box.style.position)
    }

    pub fn z_index(&self, id: BoxId) -> Option<i32> {
        self.get(id)
            .and_then(|layout_box| layout_box.style.effective_z_index())
    }

    pub fn content(&self, id: BoxId) -> Option<&BoxContent> {
        self.get(id).map(|layout_box| &layout_box.content)
    }

    /// All boxes generated by `element`, in tree order.
    pub fn boxes_for_element(&self, element: ElementId) -> impl Iterator<Item = BoxId> + '_ {
        self.descendants(self.root)
            .filter(move |id| self.node(*id).element == element)
    }

    /// `id` and all of its descendants, in pre-order (tree order).
    pub fn descendants(&self, id: BoxId) -> Descendants<'_> {
        let stack = if self.contains(id) { vec![id] } else { vec![] };
        Descendants { tree: self, stack }
    }
}

pub struct Descendants<'a> {
    tree: &'a BoxTree,
    stack: Vec<BoxId>,
}

impl Iterator for Descendants<'_> {
    type Item = BoxId;

    fn next(&mut self) -> Option<BoxId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}

struct PendingBox {
    element: ElementId,
    rect: PhysicalRect,
    style: BoxStyle,
    content: BoxContent,
    children: SmallVec<[BoxId; 4]>,
}

/// Assembles a [`BoxTree`]. Links are recorded as given and only checked by
/// [`BoxTreeBuilder::build`].
#[derive(Default)]
pub struct BoxTreeBuilder {
    boxes: Vec<PendingBox>,
    dangling: Vec<BoxId>,
}

impl BoxTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_box(
        &mut self,
        element: ElementId,
        rect: PhysicalRect,
        style: BoxStyle,
        content: BoxContent,
    ) -> BoxId {
        let id = BoxId(self.boxes.len());
        self.boxes.push(PendingBox {
            element,
            rect,
            style,
            content,
            children: SmallVec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: BoxId, child: BoxId) {
        match self.boxes.get_mut(parent.0) {
            Some(pending) => pending.children.push(child),
            None => self.dangling.push(parent),
        }
    }

    /// Validate the recorded links and freeze the tree rooted at `root`.
    pub fn build(self, root: BoxId) -> Result<BoxTree, LayoutError> {
        if let Some(id) = self.dangling.first() {
            return Err(InvalidTreeReason::DanglingId(*id).into());
        }
        if root.0 >= self.boxes.len() {
            return Err(InvalidTreeReason::DanglingId(root).into());
        }

        let parents = self.validate(root)?;

        let boxes: Vec<LayoutBox> = self
            .boxes
            .into_iter()
            .zip(parents)
            .map(|(pending, parent)| LayoutBox {
                element: pending.element,
                rect: pending.rect,
                style: pending.style,
                content: pending.content,
                parent,
                children: pending.children,
            })
            .collect();

        debug!("Built box tree with {} boxes rooted at {}", boxes.len(), root);
        Ok(BoxTree { boxes, root })
    }

    /// Depth-first walk from `root` with an explicit stack, returning the
    /// parent of every box.
    fn validate(&self, root: BoxId) -> Result<Vec<Option<BoxId>>, InvalidTreeReason> {
        #[derive(Clone, Copy, PartialEq)]
        enum Visit {
            Unseen,
            OnPath,
            Done,
        }

        let mut state = vec![Visit::Unseen; self.boxes.len()];
        let mut parents = vec![None; self.boxes.len()];

        // Each frame is a box and the index of the next child to visit.
        let mut stack = vec![(root, 0)];
        state[root.0] = Visit::OnPath;

        while let Some(frame) = stack.last_mut() {
            let (id, next_child) = *frame;
            let Some(&child) = self.boxes[id.0].children.get(next_child) else {
                state[id.0] = Visit::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match state.get(child.0) {
                None => return Err(InvalidTreeReason::DanglingId(child)),
                Some(Visit::OnPath) => return Err(InvalidTreeReason::Cycle(child)),
                Some(Visit::Done) => return Err(InvalidTreeReason::MultipleParents(child)),
                Some(Visit::Unseen) => {},
            }
            state[child.0] = Visit::OnPath;
            parents[child.0] = Some(id);
            stack.push((child, 0));
        }

        if let Some(index) = state.iter().position(|visit| *visit == Visit::Unseen) {
            return Err(InvalidTreeReason::Unreachable(BoxId(index)));
        }
        Ok(parents)
    }
}
