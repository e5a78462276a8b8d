/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Stacking contexts and the back-to-front paint order they produce.
//!
//! <https://drafts.csswg.org/css2/#elaborate-stacking-contexts>

use std::mem;

use log::debug;

use crate::box_tree::{BoxFlags, BoxId, LayoutBox};
use crate::query::LayoutSnapshot;

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) enum StackingContextSection {
    /// The background and borders of the box establishing the context.
    OwnBackgroundsAndBorders,
    /// Non-positioned, in-flow descendants.
    Content,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StackingContextType {
    /// Established by a positioned box with a numeric `z-index`, or by the root.
    Real,
    /// A positioned box with `z-index: auto`. It paints like a stacking context
    /// but its positioned descendants belong to the enclosing real context.
    PseudoPositioned,
}

struct StackingContextFragment {
    section: StackingContextSection,
    box_id: BoxId,
}

pub struct StackingContext {
    /// The box establishing this stacking context.
    root: BoxId,

    /// The stack level of this context within its parent.
    z_index: i32,

    context_type: StackingContextType,

    /// Boxes painted as part of this context, in tree order.
    fragments: Vec<StackingContextFragment>,

    /// Real and pseudo stacking context children of this stacking context.
    stacking_contexts: Vec<StackingContext>,
}

impl StackingContext {
    fn new(root: BoxId, z_index: i32, context_type: StackingContextType) -> Self {
        Self {
            root,
            z_index,
            context_type,
            fragments: vec![],
            stacking_contexts: vec![],
        }
    }

    /// Build the stacking context tree of `snapshot`. The root box always
    /// establishes a real stacking context with a stack level of 0.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "StackingContext::create_root",
            skip_all,
            level = "trace",
        )
    )]
    pub fn create_root(snapshot: &LayoutSnapshot) -> Self {
        let tree = snapshot.box_tree();
        let mut root = Self::new(tree.root(), 0, StackingContextType::Real);
        let builder = StackingContextBuilder { snapshot };
        builder.build_for_children(
            tree.root(),
            StackingContextSection::OwnBackgroundsAndBorders,
            &mut root,
        );
        root.sort();
        root
    }

    pub fn root(&self) -> BoxId {
        self.root
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn context_type(&self) -> StackingContextType {
        self.context_type
    }

    pub fn children(&self) -> &[StackingContext] {
        &self.stacking_contexts
    }

    /// Order fragments by section and children by stack level. Both sorts are
    /// stable, which leaves tree order as the only tie-break.
    fn sort(&mut self) {
        self.fragments.sort_by_key(|fragment| fragment.section);
        self.stacking_contexts.sort_by_key(StackingContext::z_index);
    }

    /// Flatten this context into `paint_order`, back to front.
    fn build_paint_order(&self, paint_order: &mut Vec<PaintItem>) {
        // Properly order items that make up a stacking context. "Steps" here
        // refer to the steps in CSS 2.1 Appendix E.

        // Step 1: Borders and background for the root
        let mut child_fragments = self.fragments.iter().peekable();
        while let Some(fragment) = child_fragments.next_if(|fragment| {
            fragment.section == StackingContextSection::OwnBackgroundsAndBorders
        }) {
            self.push_item(fragment.box_id, paint_order);
        }

        // Step 2: Positioned descendants with negative z-indices
        let mut child_stacking_contexts = self.stacking_contexts.iter().peekable();
        while let Some(child_context) =
            child_stacking_contexts.next_if(|child| child.z_index < 0)
        {
            child_context.build_paint_order(paint_order);
        }

        // Step 3: In-flow, non-positioned descendants
        for fragment in child_fragments {
            self.push_item(fragment.box_id, paint_order);
        }

        // Steps 4 & 5: Positioned descendants and stacking contexts with z-index
        // 0 or auto, then those with positive z-indices
        for child_context in child_stacking_contexts {
            child_context.build_paint_order(paint_order);
        }
    }

    fn push_item(&self, box_id: BoxId, paint_order: &mut Vec<PaintItem>) {
        paint_order.push(PaintItem {
            box_id,
            key: PaintOrderKey(paint_order.len()),
            stacking_context: self.root,
            stack_level: self.z_index,
        });
    }
}

struct StackingContextBuilder<'a> {
    snapshot: &'a LayoutSnapshot,
}

impl StackingContextBuilder<'_> {
    fn stacking_context_type(&self, layout_box: &LayoutBox) -> Option<StackingContextType> {
        if layout_box.style.establishes_stacking_context() {
            return Some(StackingContextType::Real);
        }
        if layout_box.style.position.is_positioned() {
            return Some(StackingContextType::PseudoPositioned);
        }
        None
    }

    /// A flowed element is displayed by its regions and contributes nothing
    /// where it sits in the box tree.
    fn is_displaced_by_named_flow(&self, layout_box: &LayoutBox) -> bool {
        self.snapshot.prefs().regions_enabled &&
            self.snapshot.flows().is_flowed_source(layout_box.element)
    }

    fn build_for_box(&self, box_id: BoxId, stacking_context: &mut StackingContext) {
        let layout_box = self.snapshot.box_tree().node(box_id);
        if self.is_displaced_by_named_flow(layout_box) {
            return;
        }

        match self.stacking_context_type(layout_box) {
            Some(context_type) => self.build_creating_stacking_context(
                box_id,
                layout_box,
                context_type,
                stacking_context,
            ),
            None => {
                self.build_for_children(box_id, StackingContextSection::Content, stacking_context)
            },
        }
    }

    fn build_creating_stacking_context(
        &self,
        box_id: BoxId,
        layout_box: &LayoutBox,
        context_type: StackingContextType,
        parent_stacking_context: &mut StackingContext,
    ) {
        let z_index = layout_box.style.effective_z_index().unwrap_or(0);
        let mut child_stacking_context = StackingContext::new(box_id, z_index, context_type);
        self.build_for_children(
            box_id,
            StackingContextSection::OwnBackgroundsAndBorders,
            &mut child_stacking_context,
        );

        // Positioned descendants of a pseudo stacking context are stacked in the
        // nearest real one.
        let mut stolen_children = vec![];
        if context_type != StackingContextType::Real {
            stolen_children = mem::take(&mut child_stacking_context.stacking_contexts);
        }

        child_stacking_context.sort();
        parent_stacking_context
            .stacking_contexts
            .push(child_stacking_context);
        parent_stacking_context
            .stacking_contexts
            .append(&mut stolen_children);
    }

    fn build_for_children(
        &self,
        box_id: BoxId,
        section: StackingContextSection,
        stacking_context: &mut StackingContext,
    ) {
        let tree = self.snapshot.box_tree();
        if !tree.node(box_id).style.flags.contains(BoxFlags::VISIBILITY_HIDDEN) {
            stacking_context
                .fragments
                .push(StackingContextFragment { section, box_id });
        }
        for child in tree.children(box_id) {
            self.build_for_box(*child, stacking_context);
        }
    }
}

/// The position of an item in paint order. Items with a greater key paint on
/// top of items with a smaller one.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PaintOrderKey(pub usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PaintItem {
    pub box_id: BoxId,
    pub key: PaintOrderKey,

    /// The root of the stacking context (real or pseudo) this box painted in.
    pub stacking_context: BoxId,

    /// The z-index of that stacking context.
    pub stack_level: i32,
}

/// Every painted box of a snapshot, back to front.
#[derive(Clone, Debug, Default)]
pub struct PaintOrder {
    items: Vec<PaintItem>,
}

impl PaintOrder {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "PaintOrder::build", skip_all, level = "trace")
    )]
    pub fn build(snapshot: &LayoutSnapshot) -> Self {
        let root = StackingContext::create_root(snapshot);
        let mut items = Vec::with_capacity(snapshot.box_tree().len());
        root.build_paint_order(&mut items);
        debug!("Built paint order with {} items", items.len());
        PaintOrder { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items back to front.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PaintItem> {
        self.items.iter()
    }

    /// Items front to back, the order in which hit testing visits them.
    pub fn iter_front_to_back(&self) -> impl Iterator<Item = &PaintItem> {
        self.items.iter().rev()
    }

    pub fn boxes(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.items.iter().map(|item| item.box_id)
    }

    pub fn key_of(&self, box_id: BoxId) -> Option<PaintOrderKey> {
        self.items
            .iter()
            .find(|item| item.box_id == box_id)
            .map(|item| item.key)
    }
}
