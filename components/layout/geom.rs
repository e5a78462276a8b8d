/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Geometry in viewport space, measured in app units.

use app_units::Au;

/// The unit of the physical (viewport) coordinate space shared by every box in a
/// [`crate::BoxTree`]. One CSS pixel is 60 app units.
#[derive(Clone, Copy, Debug)]
pub enum CSSPixel {}

pub type PhysicalPoint = euclid::Point2D<Au, CSSPixel>;
pub type PhysicalSize = euclid::Size2D<Au, CSSPixel>;
pub type PhysicalRect = euclid::Rect<Au, CSSPixel>;

/// A helper function to build a point from `f32` CSS pixels.
pub fn point_from_px(x: f32, y: f32) -> PhysicalPoint {
    PhysicalPoint::new(Au::from_f32_px(x), Au::from_f32_px(y))
}

/// A helper function to build a rect from `f32` CSS pixels.
pub fn rect_from_px(x: f32, y: f32, width: f32, height: f32) -> PhysicalRect {
    PhysicalRect::new(
        point_from_px(x, y),
        PhysicalSize::new(Au::from_f32_px(width), Au::from_f32_px(height)),
    )
}

/// Express `point` relative to the origin of `rect`.
pub(crate) fn to_local(point: PhysicalPoint, rect: &PhysicalRect) -> PhysicalPoint {
    (point - rect.origin).to_point()
}

/// Whether `rect` has no area. Such rects never contain a point.
pub(crate) fn is_empty(rect: &PhysicalRect) -> bool {
    rect.size.width <= Au(0) || rect.size.height <= Au(0)
}
