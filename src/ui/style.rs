use crate::layers::density::Rgb;
use egui::{Color32, FontId, Frame, Margin, Rounding, Stroke};

/// Look of the floating overlay cards (title, legend, search, buttons)
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub background: Color32,
    pub border: Stroke,
    pub rounding: Rounding,
    pub padding: Margin,
    pub title_font: FontId,
    pub body_font: FontId,
    pub text_color: Color32,
    pub muted_text_color: Color32,
    pub accent: Color32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            background: Color32::from_rgba_unmultiplied(255, 255, 255, 235),
            border: Stroke::new(1.0, Color32::from_gray(220)),
            rounding: Rounding::same(12.0),
            padding: Margin::same(12.0),
            title_font: FontId::proportional(18.0),
            body_font: FontId::proportional(13.0),
            text_color: Color32::from_gray(30),
            muted_text_color: Color32::from_gray(110),
            accent: Color32::from_rgb(0x3B, 0x82, 0xF6),
        }
    }
}

impl OverlayStyle {
    pub fn card(&self) -> Frame {
        Frame::none()
            .fill(self.background)
            .stroke(self.border)
            .rounding(self.rounding)
            .inner_margin(self.padding)
    }
}

/// Map colors that are not tied to a density bucket
#[derive(Debug, Clone)]
pub struct MapStyle {
    /// Shown where no tile has loaded yet
    pub background: Color32,
    pub tile_placeholder: Color32,
    pub attribution_color: Color32,
    pub attribution_font: FontId,
    pub control_size: f32,
    pub control_margin: f32,
    pub live: Color32,
    pub degraded: Color32,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(242, 242, 240),
            tile_placeholder: Color32::from_rgb(232, 232, 228),
            attribution_color: Color32::from_gray(120),
            attribution_font: FontId::proportional(10.0),
            control_size: 30.0,
            control_margin: 12.0,
            live: Color32::from_rgb(0x22, 0xC5, 0x5E),
            degraded: Color32::from_rgb(0xF9, 0x73, 0x16),
        }
    }
}

/// `color` with an opacity in `[0, 1]`
pub fn with_opacity(color: Rgb, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.0, color.1, color.2, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_opacity() {
        let c = with_opacity(Rgb(0xEF, 0x44, 0x44), 1.0);
        assert_eq!(c, Color32::from_rgb(0xEF, 0x44, 0x44));
        assert_eq!(with_opacity(Rgb(1, 2, 3), 0.0).a(), 0);
        assert_eq!(with_opacity(Rgb(1, 2, 3), 7.0).a(), 255);
    }
}
