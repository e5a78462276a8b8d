/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! CSS Regions named flows.
//!
//! <https://drafts.csswg.org/css-regions/#named-flows>
//!
//! An element with `flow-into: <name>` is taken out of its natural place in the
//! box tree and its content is laid out, in pieces, inside the boxes of the
//! elements declaring `flow-from: <name>`. Fragmentation itself happens in
//! layout; the registry only records where each fragment ended up so that a
//! point inside a region can be mapped back to the flowed element.

use std::fmt;
use std::sync::Arc;

use app_units::{Au, MAX_AU};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::box_tree::{BoxContent, BoxId, BoxTree, ElementId};
use crate::error::LayoutError;
use crate::geom::{PhysicalPoint, PhysicalRect};

/// The name of a named flow, as given to `flow-into` and `flow-from`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FlowId(Arc<str>);

impl FlowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FlowId {
    fn from(name: &str) -> Self {
        FlowId(Arc::from(name))
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// The piece of a named flow displayed by one region.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowFragment {
    /// The region box displaying this fragment.
    pub region: BoxId,

    /// Position of this fragment in the region chain.
    pub index: usize,

    /// Where the fragment is laid out, relative to the region's border box.
    pub content_rect: PhysicalRect,

    /// Offset of the fragment's first line within the flowed content. The
    /// fragments of a flow stack in the block direction, so this is the sum of
    /// the heights of all preceding fragments.
    pub flow_offset: Au,
}

impl FlowFragment {
    /// Map a point relative to the region's border box into the flowed
    /// element's own coordinate space.
    fn to_flow(&self, region_point: PhysicalPoint) -> Option<PhysicalPoint> {
        if !self.content_rect.contains(region_point) {
            return None;
        }
        Some(PhysicalPoint::new(
            region_point.x - self.content_rect.origin.x,
            region_point.y - self.content_rect.origin.y + self.flow_offset,
        ))
    }

    /// Map a point in the flowed element's coordinate space into this
    /// fragment's region, if this fragment displays it.
    fn to_region(&self, flow_point: PhysicalPoint) -> Option<PhysicalPoint> {
        let size = self.content_rect.size;
        let x_inside = flow_point.x >= Au(0) && flow_point.x < size.width;
        let y_inside =
            flow_point.y >= self.flow_offset && flow_point.y < self.flow_offset + size.height;
        if !x_inside || !y_inside {
            return None;
        }
        Some(PhysicalPoint::new(
            flow_point.x + self.content_rect.origin.x,
            flow_point.y - self.flow_offset + self.content_rect.origin.y,
        ))
    }
}

#[derive(Clone, Debug)]
pub struct NamedFlow {
    pub id: FlowId,

    /// The element whose content flows into the regions.
    pub source: ElementId,

    /// One fragment per consumer region, in region chain order.
    pub fragments: Vec<FlowFragment>,
}

impl NamedFlow {
    /// Total block size of the flowed content.
    pub fn content_height(&self) -> Au {
        self.fragments
            .iter()
            .fold(Au(0), |height, fragment| height + fragment.content_rect.size.height)
    }
}

/// All named flows of a document.
#[derive(Clone, Debug, Default)]
pub struct FlowRegistry {
    flows: FxHashMap<FlowId, NamedFlow>,
    flow_for_region: FxHashMap<BoxId, FlowId>,
    flow_for_source: FxHashMap<ElementId, FlowId>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the flow `flow_id`, fed by `source` and displayed by
    /// `consumers` in region chain order. Each consumer pairs a region box with
    /// the rectangle, relative to that region, that its fragment occupies.
    pub fn register_flow(
        &mut self,
        tree: &BoxTree,
        flow_id: FlowId,
        source: ElementId,
        consumers: impl IntoIterator<Item = (BoxId, PhysicalRect)>,
    ) -> Result<(), LayoutError> {
        if self.flows.contains_key(&flow_id) {
            return Err(LayoutError::DuplicateFlow(flow_id));
        }
        if self.flow_for_source.contains_key(&source) {
            return Err(LayoutError::DuplicateSource(source));
        }

        let mut seen = FxHashSet::default();
        let mut fragments = Vec::new();
        let mut flow_offset = Au(0);
        for (index, (region, content_rect)) in consumers.into_iter().enumerate() {
            let Some(region_box) = tree.get(region) else {
                return Err(LayoutError::UnknownConsumer(region));
            };
            match &region_box.content {
                BoxContent::RegionConsumer { flow } if *flow == flow_id => {},
                _ => {
                    return Err(LayoutError::NotARegion {
                        region,
                        flow: flow_id,
                    });
                },
            }
            if !seen.insert(region) {
                return Err(LayoutError::DuplicateConsumer(region));
            }

            fragments.push(FlowFragment {
                region,
                index,
                content_rect,
                flow_offset,
            });
            // `Au` addition saturates, which would give later fragments the
            // same offset.
            flow_offset = match flow_offset.0.checked_add(content_rect.size.height.0) {
                Some(offset) if offset <= MAX_AU.0 => Au(offset),
                _ => return Err(LayoutError::FlowTooLong(flow_id)),
            };
        }

        if let Some(region) = self.find_cycle(tree, source, &seen) {
            return Err(LayoutError::CyclicFlow {
                flow: flow_id,
                region,
            });
        }

        debug!(
            "Registered named flow {} from {:?} into {} regions",
            flow_id,
            source,
            fragments.len()
        );
        for fragment in &fragments {
            self.flow_for_region
                .insert(fragment.region, flow_id.clone());
        }
        self.flow_for_source.insert(source, flow_id.clone());
        self.flows.insert(
            flow_id.clone(),
            NamedFlow {
                id: flow_id,
                source,
                fragments,
            },
        );
        Ok(())
    }

    /// Look for one of `consumers` inside the content displayed from `source`,
    /// following regions of already registered flows into their own sources.
    /// Such a region would end up displaying itself.
    fn find_cycle(
        &self,
        tree: &BoxTree,
        source: ElementId,
        consumers: &FxHashSet<BoxId>,
    ) -> Option<BoxId> {
        let mut visited = FxHashSet::default();
        let mut pending = vec![source];
        while let Some(element) = pending.pop() {
            if !visited.insert(element) {
                continue;
            }
            for source_box in tree.boxes_for_element(element) {
                for id in tree.descendants(source_box) {
                    if consumers.contains(&id) {
                        return Some(id);
                    }
                    if let Some(flow) = self.flow_for_region(id) {
                        pending.push(flow.source);
                    }
                }
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn flow(&self, flow_id: &FlowId) -> Option<&NamedFlow> {
        self.flows.get(flow_id)
    }

    pub fn flows(&self) -> impl Iterator<Item = &NamedFlow> {
        self.flows.values()
    }

    pub fn flow_for_region(&self, region: BoxId) -> Option<&NamedFlow> {
        self.flow_for_region
            .get(&region)
            .and_then(|flow_id| self.flows.get(flow_id))
    }

    pub fn flow_for_source(&self, element: ElementId) -> Option<&NamedFlow> {
        self.flow_for_source
            .get(&element)
            .and_then(|flow_id| self.flows.get(flow_id))
    }

    /// Whether `element` has been taken out of its natural position to feed a
    /// named flow.
    pub fn is_flowed_source(&self, element: ElementId) -> bool {
        self.flow_for_source.contains_key(&element)
    }

    pub fn fragment_for_region(&self, region: BoxId) -> Option<&FlowFragment> {
        self.flow_for_region(region)?
            .fragments
            .iter()
            .find(|fragment| fragment.region == region)
    }

    /// Map `local_point`, relative to the border box of `region`, to the flowed
    /// element and the corresponding point in that element's own coordinate
    /// space. Returns `None` when the point is not over the region's fragment,
    /// for instance on the region's border or padding.
    pub fn resolve(
        &self,
        region: BoxId,
        local_point: PhysicalPoint,
    ) -> Option<(ElementId, PhysicalPoint)> {
        let flow = self.flow_for_region(region)?;
        let fragment = flow
            .fragments
            .iter()
            .find(|fragment| fragment.region == region)?;
        fragment
            .to_flow(local_point)
            .map(|flow_point| (flow.source, flow_point))
    }

    /// The inverse of [`FlowRegistry::resolve`]: find the region displaying
    /// `flow_point` of `flow_id` and the point relative to that region.
    pub fn project(
        &self,
        flow_id: &FlowId,
        flow_point: PhysicalPoint,
    ) -> Option<(BoxId, PhysicalPoint)> {
        self.flow(flow_id)?.fragments.iter().find_map(|fragment| {
            fragment
                .to_region(flow_point)
                .map(|region_point| (fragment.region, region_point))
        })
    }
}
