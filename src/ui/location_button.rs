use crate::runtime::{self, AsyncSpawner};
use crate::traits::LocationCentering;
use egui::{Response, Ui, Widget};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Survives between frames; tracks the request in flight
#[derive(Debug, Clone, Default)]
pub struct LocationButtonState {
    busy: Arc<AtomicBool>,
}

impl LocationButtonState {
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// "Find my location": centers the map on the device or the default spot
pub struct LocationButton<'a> {
    state: &'a LocationButtonState,
    target: Arc<dyn LocationCentering>,
    spawner: Arc<dyn AsyncSpawner>,
}

impl<'a> LocationButton<'a> {
    pub fn new(
        state: &'a LocationButtonState,
        target: Arc<dyn LocationCentering>,
        spawner: Arc<dyn AsyncSpawner>,
    ) -> Self {
        Self {
            state,
            target,
            spawner,
        }
    }

    fn start(&self, ctx: egui::Context) {
        // a second click while locating is ignored
        if self.state.busy.swap(true, Ordering::SeqCst) {
            return;
        }

        let busy = self.state.busy.clone();
        let target = self.target.clone();
        runtime::spawn(self.spawner.as_ref(), async move {
            let outcome = target.center_to_current_or_default_location().await;
            log::debug!("Location button resolved to {outcome:?}");
            busy.store(false, Ordering::SeqCst);
            ctx.request_repaint();
        });
    }
}

impl Widget for LocationButton<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let busy = self.state.is_busy();
        let label = if busy { "Locating…" } else { "◎ My location" };

        let response = ui
            .add_enabled(!busy, egui::Button::new(label).min_size(egui::vec2(44.0, 44.0)))
            .on_hover_text("Find my location");

        if busy {
            ui.ctx()
                .request_repaint_after(std::time::Duration::from_millis(100));
        }
        if response.clicked() {
            self.start(ui.ctx().clone());
        }
        response
    }
}
