use egui::{Align2, Area, Context, Frame, Id, Order, Pos2, Vec2};

/// Gap between the popup's tip and the top of the circle
const POPUP_OFFSET: f32 = 8.0;

/// First line is the title, the rest is body text
pub fn popup_lines(text: &str) -> (&str, Vec<&str>) {
    let mut lines = text.lines();
    let title = lines.next().unwrap_or_default();
    (title, lines.collect())
}

/// Draws the marker popup centered above `anchor`
///
/// Returns true when the close button was clicked.
pub fn show_popup(ctx: &Context, anchor: Pos2, text: &str) -> bool {
    let (title, body) = popup_lines(text);
    let mut close = false;

    Area::new(Id::new("crowd_marker_popup"))
        .order(Order::Foreground)
        .fixed_pos(anchor - Vec2::new(0.0, POPUP_OFFSET))
        .pivot(Align2::CENTER_BOTTOM)
        .show(ctx, |ui| {
            Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.strong(title);
                    if ui.small_button("×").clicked() {
                        close = true;
                    }
                });
                for line in body {
                    ui.label(line);
                }
            });
        });

    close
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_lines() {
        let (title, body) = popup_lines("Times Square\nCrowd Level: 90%");
        assert_eq!(title, "Times Square");
        assert_eq!(body, vec!["Crowd Level: 90%"]);

        let (title, body) = popup_lines("");
        assert_eq!(title, "");
        assert!(body.is_empty());
    }
}
