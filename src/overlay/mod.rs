//! Display-space overlay construction.
//!
//! [`OverlayMapper`] rescales detection boxes from model-input coordinates
//! into the live display's coordinate space and builds the label text, color
//! and measured label size for each box. [`OverlayStateManager`] (in `state`)
//! owns the single overlay state the renderer reads.

mod state;

pub use state::{NullSink, OverlayState, OverlayStateManager, RenderSink};

use crate::detect::Detection;
use crate::{Rect, Size};

/// Point size for overlay labels (medium weight on the render side).
pub const DISPLAY_FONT_SIZE: f32 = 14.0;

/// Inset boxes are clamped to so borders stay visible at the display edges.
pub const EDGE_INSET: f32 = 2.0;

/// RGB color of an overlay border.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// Border palette, cycled per class so a class keeps its color across frames.
const PALETTE: &[Color] = &[
    Color { r: 255, g: 59, b: 48 },
    Color { r: 255, g: 149, b: 0 },
    Color { r: 255, g: 204, b: 0 },
    Color { r: 52, g: 199, b: 89 },
    Color { r: 90, g: 200, b: 250 },
    Color { r: 0, g: 122, b: 255 },
    Color { r: 175, g: 82, b: 222 },
];

/// Measured size of a rendered label string.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LabelSize {
    pub width: f32,
    pub height: f32,
}

/// Text-measurement collaborator.
///
/// Measuring rendered text belongs to the deployment's UI toolkit, not to the
/// mapping logic; the mapper only guarantees it calls `measure` exactly once
/// per overlay item per frame, at [`DISPLAY_FONT_SIZE`].
pub trait TextMeasurer: Send {
    fn measure(&self, text: &str) -> LabelSize;
}

/// Fallback measurer for demos and tests: fixed average glyph advance.
pub struct HeuristicTextMeasurer {
    point_size: f32,
}

impl HeuristicTextMeasurer {
    pub fn new(point_size: f32) -> Self {
        Self { point_size }
    }
}

impl Default for HeuristicTextMeasurer {
    fn default() -> Self {
        Self::new(DISPLAY_FONT_SIZE)
    }
}

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str) -> LabelSize {
        LabelSize {
            width: text.chars().count() as f32 * self.point_size * 0.6,
            height: self.point_size * 1.2,
        }
    }
}

/// One detection rendered into display coordinates.
#[derive(Clone, Debug)]
pub struct OverlayItem {
    /// `"<class>  (<confidence%>)"`, two literal spaces.
    pub label: String,
    /// Border rectangle in display pixels.
    pub border_rect: Rect,
    pub color: Color,
    pub label_size: LabelSize,
}

/// Maps detections from model-input space into display space.
///
/// Pure per call: identical inputs always yield identical items. The only
/// collaborator it touches is the [`TextMeasurer`], which is immutable.
pub struct OverlayMapper {
    inset: f32,
    measurer: Box<dyn TextMeasurer>,
}

impl OverlayMapper {
    pub fn new() -> Self {
        Self {
            inset: EDGE_INSET,
            measurer: Box::new(HeuristicTextMeasurer::default()),
        }
    }

    /// Use the deployment's real text-measurement facility.
    pub fn with_measurer(mut self, measurer: Box<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Rescale one detection from `from` space into `to` space.
    ///
    /// Each axis scales independently; non-uniform scale is expected and
    /// correct when the aspect ratios differ. Edge policy, in this order:
    /// a negative left/top edge is clamped to the inset, then a far edge past
    /// the destination bound shrinks the box's height/width (never its
    /// origin) to terminate at bound minus inset. Shrinking instead of moving
    /// the origin keeps the label anchor stable.
    pub fn map(&self, detection: &Detection, from: Size, to: Size) -> OverlayItem {
        let sx = to.width as f32 / from.width as f32;
        let sy = to.height as f32 / from.height as f32;

        let mut rect = Rect::new(
            detection.rect.x * sx,
            detection.rect.y * sy,
            detection.rect.width * sx,
            detection.rect.height * sy,
        );

        if rect.x < 0.0 {
            rect.x = self.inset;
        }
        if rect.y < 0.0 {
            rect.y = self.inset;
        }
        let bound_y = to.height as f32;
        if rect.max_y() > bound_y {
            rect.height = bound_y - rect.y - self.inset;
        }
        let bound_x = to.width as f32;
        if rect.max_x() > bound_x {
            rect.width = bound_x - rect.x - self.inset;
        }

        let label = format_label(&detection.class_label, detection.confidence);
        let label_size = self.measurer.measure(&label);

        OverlayItem {
            color: color_for_class(&detection.class_label),
            label,
            border_rect: rect,
            label_size,
        }
    }
}

impl Default for OverlayMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(class_label: &str, confidence: f32) -> String {
    format!("{}  ({}%)", class_label, (confidence * 100.0) as i32)
}

fn color_for_class(class_label: &str) -> Color {
    let hash = class_label
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    PALETTE[hash % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(rect: Rect) -> Detection {
        Detection {
            class_label: "person".to_string(),
            confidence: 0.9,
            rect,
        }
    }

    #[test]
    fn boxes_inside_the_frame_scale_linearly() {
        let mapper = OverlayMapper::new();
        let from = Size::new(300, 300);
        let to = Size::new(600, 150);

        let item = mapper.map(&det(Rect::new(30.0, 60.0, 90.0, 120.0)), from, to);

        assert_eq!(item.border_rect, Rect::new(60.0, 30.0, 180.0, 60.0));
    }

    #[test]
    fn negative_origin_clamps_to_inset_without_resizing() {
        let mapper = OverlayMapper::new();
        let from = Size::new(300, 300);
        let to = Size::new(300, 300);

        let item = mapper.map(&det(Rect::new(-10.0, -4.0, 50.0, 60.0)), from, to);

        assert_eq!(item.border_rect.x, EDGE_INSET);
        assert_eq!(item.border_rect.y, EDGE_INSET);
        assert_eq!(item.border_rect.width, 50.0);
        assert_eq!(item.border_rect.height, 60.0);
    }

    #[test]
    fn far_edge_overflow_shrinks_size_not_origin() {
        let mapper = OverlayMapper::new();
        let from = Size::new(300, 300);
        let to = Size::new(300, 300);

        let item = mapper.map(&det(Rect::new(250.0, 280.0, 100.0, 100.0)), from, to);

        assert_eq!(item.border_rect.x, 250.0);
        assert_eq!(item.border_rect.y, 280.0);
        assert_eq!(item.border_rect.width, 300.0 - 250.0 - EDGE_INSET);
        assert_eq!(item.border_rect.height, 300.0 - 280.0 - EDGE_INSET);
    }

    #[test]
    fn mapping_is_idempotent() {
        let mapper = OverlayMapper::new();
        let d = det(Rect::new(12.0, 34.0, 56.0, 78.0));
        let from = Size::new(300, 300);
        let to = Size::new(1920, 1080);

        let a = mapper.map(&d, from, to);
        let b = mapper.map(&d, from, to);

        assert_eq!(a.border_rect, b.border_rect);
        assert_eq!(a.label, b.label);
        assert_eq!(a.label_size, b.label_size);
        assert_eq!(a.color, b.color);
    }

    #[test]
    fn car_at_87_percent_maps_with_per_axis_scale() {
        let mapper = OverlayMapper::new();
        let d = Detection {
            class_label: "car".to_string(),
            confidence: 0.873,
            rect: Rect::new(10.0, 10.0, 100.0, 50.0),
        };

        // Width halves, height doubles.
        let item = mapper.map(&d, Size::new(300, 150), Size::new(150, 300));

        assert_eq!(item.border_rect, Rect::new(5.0, 20.0, 50.0, 100.0));
        assert_eq!(item.label, "car  (87%)");
    }

    #[test]
    fn label_percent_truncates() {
        assert_eq!(format_label("dog", 0.999), "dog  (99%)");
        assert_eq!(format_label("dog", 0.5), "dog  (50%)");
    }

    #[test]
    fn class_color_is_stable() {
        assert_eq!(color_for_class("person"), color_for_class("person"));
    }
}
