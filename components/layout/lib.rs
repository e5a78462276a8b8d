/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

//! Paint order and point hit testing over a frozen box tree, including boxes
//! whose content is supplied by CSS Regions named flows.
//!
//! Layout hands over a [`BoxTree`] and a [`FlowRegistry`] frozen together in a
//! [`LayoutSnapshot`]. From a snapshot, [`PaintOrder::build`] derives the back
//! to front order of boxes following the CSS stacking rules, and [`hit_test`]
//! walks that order front to back to find the element under a point.

mod box_tree;
mod error;
mod flow_registry;
pub mod geom;
mod hit_test;
mod prefs;
mod query;
mod stacking_context;

pub use box_tree::{
    BoxContent, BoxFlags, BoxId, BoxStyle, BoxTree, BoxTreeBuilder, Descendants, ElementId,
    LayoutBox, Position,
};
pub use error::{InvalidTreeReason, LayoutError};
pub use flow_registry::{FlowFragment, FlowId, FlowRegistry, NamedFlow};
pub use hit_test::{HitResult, hit_test, hit_test_all};
pub use prefs::LayoutPrefs;
pub use query::{LayoutSnapshot, element_from_point, elements_from_point};
pub use stacking_context::{
    PaintItem, PaintOrder, PaintOrderKey, StackingContext, StackingContextType,
};
