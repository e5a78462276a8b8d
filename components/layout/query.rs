/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Utilities for querying the layout, as needed by script.

use log::debug;

use crate::box_tree::{BoxContent, BoxTree, ElementId};
use crate::error::LayoutError;
use crate::flow_registry::FlowRegistry;
use crate::geom::point_from_px;
use crate::hit_test::{hit_test, hit_test_all};
use crate::prefs::LayoutPrefs;
use crate::stacking_context::PaintOrder;

/// A frozen view of layout: the box tree, the named flows displayed through
/// it and the preferences it was laid out under.
///
/// A snapshot is never mutated once built. Share it between threads with an
/// `Arc` and run any number of queries against it concurrently; layout builds
/// a new snapshot after every style or geometry change.
#[derive(Clone, Debug)]
pub struct LayoutSnapshot {
    box_tree: BoxTree,
    flows: FlowRegistry,
    prefs: LayoutPrefs,
}

impl LayoutSnapshot {
    /// Freeze `box_tree` and `flows`. Every region recorded in `flows` must be
    /// a box of `box_tree` taking its content from that flow.
    pub fn new(
        box_tree: BoxTree,
        flows: FlowRegistry,
        prefs: LayoutPrefs,
    ) -> Result<Self, LayoutError> {
        for flow in flows.flows() {
            for fragment in &flow.fragments {
                let Some(region) = box_tree.get(fragment.region) else {
                    return Err(LayoutError::UnknownConsumer(fragment.region));
                };
                match &region.content {
                    BoxContent::RegionConsumer { flow: consumed } if *consumed == flow.id => {},
                    _ => {
                        return Err(LayoutError::NotARegion {
                            region: fragment.region,
                            flow: flow.id.clone(),
                        });
                    },
                }
            }
        }

        debug!(
            "Froze layout snapshot with {} boxes (regions enabled: {})",
            box_tree.len(),
            prefs.regions_enabled
        );
        Ok(Self {
            box_tree,
            flows,
            prefs,
        })
    }

    pub fn box_tree(&self) -> &BoxTree {
        &self.box_tree
    }

    pub fn flows(&self) -> &FlowRegistry {
        &self.flows
    }

    pub fn prefs(&self) -> &LayoutPrefs {
        &self.prefs
    }

    pub fn paint_order(&self) -> PaintOrder {
        PaintOrder::build(self)
    }
}

/// The element painted topmost at (`x`, `y`) CSS pixels in the viewport, as
/// needed by `Document.elementFromPoint`.
pub fn element_from_point(snapshot: &LayoutSnapshot, x: f32, y: f32) -> Option<ElementId> {
    let paint_order = snapshot.paint_order();
    hit_test(snapshot, &paint_order, point_from_px(x, y)).map(|hit| hit.element)
}

/// Every element painted at (`x`, `y`), topmost first, as needed by
/// `Document.elementsFromPoint`. An element hit through several of its boxes
/// is only listed once.
pub fn elements_from_point(snapshot: &LayoutSnapshot, x: f32, y: f32) -> Vec<ElementId> {
    let paint_order = snapshot.paint_order();
    let mut elements: Vec<ElementId> = vec![];
    for hit in hit_test_all(snapshot, &paint_order, point_from_px(x, y)) {
        if !elements.contains(&hit.element) {
            elements.push(hit.element);
        }
    }
    elements
}
