/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Finding the element painted topmost at a point.

use log::trace;

use crate::box_tree::{BoxFlags, BoxId, ElementId, LayoutBox};
use crate::geom::{self, PhysicalPoint};
use crate::query::LayoutSnapshot;
use crate::stacking_context::{PaintItem, PaintOrder};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HitResult {
    /// The element that was hit. For a hit inside a region's fragment this is
    /// the flowed element rather than the region.
    pub element: ElementId,

    /// The box whose paint item was hit.
    pub box_id: BoxId,

    /// The hit point in the coordinate space of `element`: relative to the
    /// box's border box, or to the flowed content for hits through a region.
    pub point_in_element: PhysicalPoint,

    /// The region the hit was resolved through, if any.
    pub via_region: Option<BoxId>,
}

/// Return the topmost hit at `point`, or `None` if no box contains it.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "hit_test", skip(snapshot, paint_order), level = "trace")
)]
pub fn hit_test(
    snapshot: &LayoutSnapshot,
    paint_order: &PaintOrder,
    point: PhysicalPoint,
) -> Option<HitResult> {
    hits(snapshot, paint_order, point).next()
}

/// Return every hit at `point`, topmost first.
pub fn hit_test_all(
    snapshot: &LayoutSnapshot,
    paint_order: &PaintOrder,
    point: PhysicalPoint,
) -> Vec<HitResult> {
    hits(snapshot, paint_order, point).collect()
}

fn hits<'a>(
    snapshot: &'a LayoutSnapshot,
    paint_order: &'a PaintOrder,
    point: PhysicalPoint,
) -> impl Iterator<Item = HitResult> + 'a {
    paint_order
        .iter_front_to_back()
        .filter_map(move |item| hit_test_item(snapshot, item, point))
}

fn hit_test_item(
    snapshot: &LayoutSnapshot,
    item: &PaintItem,
    point: PhysicalPoint,
) -> Option<HitResult> {
    let layout_box = snapshot.box_tree().get(item.box_id)?;
    if !is_hit_target(snapshot, layout_box) || !layout_box.rect.contains(point) {
        return None;
    }

    let local_point = geom::to_local(point, &layout_box.rect);
    if snapshot.prefs().regions_enabled && layout_box.is_region() {
        // Over the fragment the region is transparent to its flowed content.
        // Over its own borders and padding it is hit like any other box.
        if let Some((element, flow_point)) = snapshot.flows().resolve(item.box_id, local_point) {
            trace!(
                "Hit at {:?} resolved through region {} to {:?}",
                point,
                item.box_id,
                element
            );
            return Some(HitResult {
                element,
                box_id: item.box_id,
                point_in_element: flow_point,
                via_region: Some(item.box_id),
            });
        }
    }

    trace!("Hit at {:?} on box {}", point, item.box_id);
    Some(HitResult {
        element: layout_box.element,
        box_id: item.box_id,
        point_in_element: local_point,
        via_region: None,
    })
}

fn is_hit_target(snapshot: &LayoutSnapshot, layout_box: &LayoutBox) -> bool {
    if geom::is_empty(&layout_box.rect) {
        return false;
    }
    !(snapshot.prefs().honor_pointer_events &&
        layout_box
            .style
            .flags
            .contains(BoxFlags::POINTER_EVENTS_NONE))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::box_tree::{BoxContent, BoxStyle, BoxTreeBuilder, Position};
    use crate::flow_registry::{FlowId, FlowRegistry};
    use crate::geom::{point_from_px, rect_from_px};
    use crate::prefs::LayoutPrefs;

    fn snapshot_with(prefs: LayoutPrefs) -> (LayoutSnapshot, BoxId, BoxId, BoxId) {
        let flow = FlowId::from("story");
        let mut builder = BoxTreeBuilder::new();
        let root = builder.new_box(
            ElementId(0),
            rect_from_px(0., 0., 400., 400.),
            BoxStyle::default(),
            BoxContent::Normal,
        );
        let source = builder.new_box(
            ElementId(1),
            rect_from_px(0., 0., 100., 100.),
            BoxStyle::default(),
            BoxContent::Normal,
        );
        let region = builder.new_box(
            ElementId(2),
            rect_from_px(100., 100., 100., 100.),
            BoxStyle::positioned(Position::Absolute, Some(1)),
            BoxContent::RegionConsumer { flow: flow.clone() },
        );
        let overlay = builder.new_box(
            ElementId(3),
            rect_from_px(150., 150., 100., 100.),
            BoxStyle::positioned(Position::Absolute, Some(2))
                .with_flags(BoxFlags::POINTER_EVENTS_NONE),
            BoxContent::Normal,
        );
        builder.append_child(root, source);
        builder.append_child(root, region);
        builder.append_child(root, overlay);
        let tree = builder.build(root).unwrap();

        let mut flows = FlowRegistry::new();
        flows
            .register_flow(
                &tree,
                flow,
                ElementId(1),
                vec![(region, rect_from_px(10., 10., 80., 80.))],
            )
            .unwrap();
        let snapshot = LayoutSnapshot::new(tree, flows, prefs).unwrap();
        (snapshot, root, region, overlay)
    }

    fn topmost(snapshot: &LayoutSnapshot, x: f32, y: f32) -> Option<HitResult> {
        hit_test(snapshot, &PaintOrder::build(snapshot), point_from_px(x, y))
    }

    #[test]
    fn test_hit_through_region_content() {
        let (snapshot, _, region, _) = snapshot_with(LayoutPrefs::default());
        let hit = topmost(&snapshot, 120., 130.).unwrap();
        assert_eq!(hit.element, ElementId(1));
        assert_eq!(hit.via_region, Some(region));
        assert_eq!(hit.point_in_element, point_from_px(10., 20.));
    }

    #[test]
    fn test_hit_on_region_border() {
        let (snapshot, _, region, _) = snapshot_with(LayoutPrefs::default());
        let hit = topmost(&snapshot, 105., 130.).unwrap();
        assert_eq!(hit.element, ElementId(2));
        assert_eq!(hit.box_id, region);
        assert_eq!(hit.via_region, None);
    }

    #[test]
    fn test_pointer_events_none_is_skipped() {
        let (snapshot, _, region, overlay) = snapshot_with(LayoutPrefs::default());
        // Inside both the overlay and the region's fragment.
        let hit = topmost(&snapshot, 160., 160.).unwrap();
        assert_eq!(hit.via_region, Some(region));

        let prefs = LayoutPrefs {
            honor_pointer_events: false,
            ..LayoutPrefs::default()
        };
        let (snapshot, ..) = snapshot_with(prefs);
        let hit = topmost(&snapshot, 160., 160.).unwrap();
        assert_eq!(hit.box_id, overlay);
    }

    #[test]
    fn test_regions_disabled() {
        let prefs = LayoutPrefs {
            regions_enabled: false,
            ..LayoutPrefs::default()
        };
        let (snapshot, ..) = snapshot_with(prefs);
        assert_eq!(topmost(&snapshot, 120., 130.).unwrap().element, ElementId(2));
        // The source paints in place again.
        assert_eq!(topmost(&snapshot, 50., 50.).unwrap().element, ElementId(1));
    }

    #[test]
    fn test_hit_test_all_is_front_to_back() {
        let (snapshot, root, region, _) = snapshot_with(LayoutPrefs::default());
        let paint_order = PaintOrder::build(&snapshot);
        let hits = hit_test_all(&snapshot, &paint_order, point_from_px(120., 130.));
        let boxes: Vec<_> = hits.iter().map(|hit| hit.box_id).collect();
        assert_eq!(boxes, vec![region, root]);
    }

    #[test]
    fn test_no_hit_outside_every_box() {
        let (snapshot, ..) = snapshot_with(LayoutPrefs::default());
        assert_eq!(topmost(&snapshot, 500., 10.), None);
        assert_eq!(topmost(&snapshot, -1., 10.), None);
    }
}
