/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;

use crate::box_tree::{BoxId, ElementId};
use crate::flow_registry::FlowId;

/// Why a box tree handed over by layout was rejected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InvalidTreeReason {
    /// A parent or child reference names a box that was never created.
    DanglingId(BoxId),
    /// The box is its own ancestor.
    Cycle(BoxId),
    /// The box was appended to more than one parent.
    MultipleParents(BoxId),
    /// The box is not reachable from the root.
    Unreachable(BoxId),
}

/// The errors that building a layout snapshot can generate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LayoutError {
    /// The box tree is not a tree.
    InvalidTree(InvalidTreeReason),
    /// A flow with this name has already been registered.
    DuplicateFlow(FlowId),
    /// The element is already the source of another named flow.
    DuplicateSource(ElementId),
    /// A consumer region does not exist in the box tree.
    UnknownConsumer(BoxId),
    /// A consumer box exists but does not take its content from the flow.
    NotARegion { region: BoxId, flow: FlowId },
    /// A region box was listed more than once as a consumer.
    DuplicateConsumer(BoxId),
    /// A consumer region sits inside content displayed from this flow's
    /// source, directly or through the regions of other flows.
    CyclicFlow { flow: FlowId, region: BoxId },
    /// The fragments of the flow are taller, in total, than an app unit
    /// length can express.
    FlowTooLong(FlowId),
    /// A preferences document could not be parsed.
    InvalidPrefs(String),
}

impl std::error::Error for LayoutError {}

impl fmt::Display for InvalidTreeReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            InvalidTreeReason::DanglingId(id) => write!(f, "reference to missing box {id}"),
            InvalidTreeReason::Cycle(id) => write!(f, "box {id} is its own ancestor"),
            InvalidTreeReason::MultipleParents(id) => {
                write!(f, "box {id} has more than one parent")
            },
            InvalidTreeReason::Unreachable(id) => {
                write!(f, "box {id} is not reachable from the root")
            },
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LayoutError::InvalidTree(reason) => write!(f, "Invalid box tree: {reason}"),
            LayoutError::DuplicateFlow(flow) => write!(f, "Named flow {flow} already registered"),
            LayoutError::DuplicateSource(element) => {
                write!(f, "Element {element:?} already feeds a named flow")
            },
            LayoutError::UnknownConsumer(region) => write!(f, "Unknown region box {region}"),
            LayoutError::NotARegion { region, flow } => {
                write!(f, "Box {region} does not consume from named flow {flow}")
            },
            LayoutError::DuplicateConsumer(region) => {
                write!(f, "Region box {region} listed twice as a consumer")
            },
            LayoutError::CyclicFlow { flow, region } => write!(
                f,
                "Named flow {flow} would display its own region box {region}"
            ),
            LayoutError::FlowTooLong(flow) => {
                write!(f, "Named flow {flow} is too long to lay out")
            },
            LayoutError::InvalidPrefs(message) => write!(f, "Invalid layout prefs: {message}"),
        }
    }
}

impl From<InvalidTreeReason> for LayoutError {
    fn from(reason: InvalidTreeReason) -> Self {
        LayoutError::InvalidTree(reason)
    }
}
