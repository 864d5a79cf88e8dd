//! Banner, toasts and the loading overlay

use crate::core::notice::{Notice, NoticeSeverity};
use crate::ui::style::OverlayStyle;
use crate::CrowdMapHandle;
use egui::{Align2, Area, Color32, Context, Id, Order, RichText, Vec2};
use std::time::Duration;

fn accent(severity: NoticeSeverity) -> Color32 {
    match severity {
        NoticeSeverity::Info => Color32::from_rgb(0x22, 0xC5, 0x5E),
        NoticeSeverity::Warning => Color32::from_rgb(0xF9, 0x73, 0x16),
        NoticeSeverity::Error => Color32::from_rgb(0xEF, 0x44, 0x44),
    }
}

/// Sticky error notices go in the banner, the rest are toasts
pub fn is_banner(notice: &Notice) -> bool {
    notice.severity == NoticeSeverity::Error && notice.ttl.is_none()
}

/// Draws every active notice; dismiss buttons go straight to the handle
pub fn show_notices(ctx: &Context, handle: &CrowdMapHandle, style: &OverlayStyle) {
    let notices = handle.notices();
    let (banner, toasts): (Vec<&Notice>, Vec<&Notice>) = notices.iter().partition(|n| is_banner(n));

    if let Some(notice) = banner.first() {
        Area::new(Id::new("crowd_error_banner"))
            .order(Order::Foreground)
            .anchor(Align2::CENTER_TOP, Vec2::new(0.0, 84.0))
            .show(ctx, |ui| {
                style
                    .card()
                    .fill(Color32::from_rgb(0xFE, 0xF2, 0xF2))
                    .stroke(egui::Stroke::new(1.0, accent(notice.severity)))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(&notice.title).color(accent(notice.severity)));
                            if ui.small_button("×").clicked() {
                                handle.dismiss_notice(notice.id);
                            }
                        });
                    });
            });
    }

    if toasts.is_empty() {
        return;
    }

    Area::new(Id::new("crowd_toasts"))
        .order(Order::Foreground)
        .anchor(Align2::RIGHT_TOP, Vec2::new(-16.0, 84.0))
        .show(ctx, |ui| {
            for notice in &toasts {
                style.card().show(ui, |ui| {
                    ui.set_max_width(280.0);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&notice.title).strong().color(accent(notice.severity)));
                        if ui.small_button("×").clicked() {
                            handle.dismiss_notice(notice.id);
                        }
                    });
                    if let Some(description) = &notice.description {
                        ui.label(RichText::new(description).color(style.muted_text_color));
                    }
                });
                ui.add_space(6.0);
            }
        });

    // toasts expire on their own; make sure a frame happens when they do
    ctx.request_repaint_after(Duration::from_millis(500));
}

/// Covers the map until the first data set arrives
pub fn show_loading(ctx: &Context, handle: &CrowdMapHandle, style: &OverlayStyle) {
    let waiting = handle.read(|s| s.is_loading() && s.snapshot().is_empty());
    if !waiting {
        return;
    }

    Area::new(Id::new("crowd_loading"))
        .order(Order::Foreground)
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            style.card().show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new("Loading crowd data...").color(style.text_color));
                });
            });
        });
}
