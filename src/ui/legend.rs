use crate::layers::density::{LegendEntry, LEGEND, LEGEND_FOOTER, LEGEND_TITLE};
use crate::ui::style::{with_opacity, OverlayStyle};
use egui::{Color32, Response, Sense, Stroke, Ui, Vec2, Widget};

const SWATCH_RADIUS: f32 = 6.0;

/// The static "Crowd Density" key
pub struct Legend {
    entries: &'static [LegendEntry],
    style: OverlayStyle,
}

impl Legend {
    pub fn new() -> Self {
        Self {
            entries: &LEGEND,
            style: OverlayStyle::default(),
        }
    }
}

impl Default for Legend {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Legend {
    fn ui(self, ui: &mut Ui) -> Response {
        let time = ui.input(|i| i.time) as f32;
        let mut pulsing = false;

        let response = self
            .style
            .card()
            .show(ui, |ui| {
                ui.label(
                    egui::RichText::new(LEGEND_TITLE)
                        .strong()
                        .color(self.style.text_color),
                );
                ui.add_space(4.0);

                for entry in self.entries {
                    ui.horizontal(|ui| {
                        let (rect, _) = ui.allocate_exact_size(
                            Vec2::splat(SWATCH_RADIUS * 2.0 + 4.0),
                            Sense::hover(),
                        );
                        let alpha = if entry.pulsing {
                            pulsing = true;
                            0.6 + 0.4 * (time * 4.0).sin().abs()
                        } else {
                            1.0
                        };
                        ui.painter().circle(
                            rect.center(),
                            SWATCH_RADIUS,
                            with_opacity(entry.color, alpha),
                            Stroke::new(1.0, Color32::from_black_alpha(30)),
                        );
                        ui.label(egui::RichText::new(entry.label).color(self.style.text_color));
                        ui.label(
                            egui::RichText::new(entry.range)
                                .small()
                                .color(self.style.muted_text_color),
                        );
                    });
                }

                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(LEGEND_FOOTER)
                        .small()
                        .color(self.style.muted_text_color),
                );
            })
            .response;

        if pulsing {
            ui.ctx().request_repaint_after(std::time::Duration::from_millis(50));
        }
        response
    }
}
