use eframe::egui::Color32;
use palette::{named, Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Marker paint
// ---------------------------------------------------------------------------

/// Fill opacity of every place marker.
pub const MARKER_FILL_OPACITY: f32 = 0.7;

/// Heading colour of marker popups.
pub const POPUP_HEADING: Srgb<u8> = Srgb::new(0x2e, 0x86, 0xab);

/// Stroke and fill of a circle marker. All place markers share one accent
/// colour; size, not hue, carries the occurrence count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub stroke: Srgb<u8>,
    pub fill: Srgb<u8>,
    pub fill_opacity: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self::crimson()
    }
}

impl MarkerStyle {
    pub const fn crimson() -> Self {
        MarkerStyle {
            stroke: named::CRIMSON,
            fill: named::CRIMSON,
            fill_opacity: MARKER_FILL_OPACITY,
        }
    }

    pub fn stroke_color32(&self) -> Color32 {
        to_color32(self.stroke)
    }

    /// Fill colour with the marker opacity applied.
    pub fn fill_color32(&self) -> Color32 {
        let alpha = (self.fill_opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(self.fill.red, self.fill.green, self.fill.blue, alpha)
    }
}

/// CSS hex notation, e.g. `#dc143c`.
pub fn hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

pub fn to_color32(color: Srgb<u8>) -> Color32 {
    Color32::from_rgb(color.red, color.green, color.blue)
}

// ---------------------------------------------------------------------------
// Cluster glyph colours
// ---------------------------------------------------------------------------

/// Colour of a cluster glyph: green for small clusters shading to orange for
/// large ones, following the usual marker-cluster convention.
pub fn cluster_color(members: usize) -> Color32 {
    let weight = ((members.max(1) as f32).log10() / 2.0).clamp(0.0, 1.0);
    let hue = 120.0 - 90.0 * weight;
    let hsl = Hsl::new(hue, 0.65, 0.5);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgba_unmultiplied(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
        200,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crimson_hex() {
        let style = MarkerStyle::default();
        assert_eq!(hex(style.fill), "#dc143c");
        assert_eq!(hex(POPUP_HEADING), "#2e86ab");
    }

    #[test]
    fn fill_carries_opacity() {
        // Color32 is premultiplied; compare the straight-alpha channels.
        let [r, g, b, a] = MarkerStyle::crimson().fill_color32().to_srgba_unmultiplied();
        let expected = [0xdc, 0x14, 0x3c, 179];
        for (got, want) in [r, g, b, a].into_iter().zip(expected) {
            assert!(got.abs_diff(want) <= 1, "channel {got} != {want}");
        }
    }

    #[test]
    fn larger_clusters_shift_towards_orange() {
        let small = cluster_color(2);
        let large = cluster_color(150);
        assert!(large.r() > small.r());
        assert!(large.g() <= small.g());
    }
}
