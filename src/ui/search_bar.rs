use crate::search::{SearchBox, SearchKey};
use crate::ui::style::OverlayStyle;
use egui::{Key, Response, TextEdit, Ui, Widget};

/// Text field plus suggestion dropdown over a [`SearchBox`]
pub struct SearchBar<'a> {
    state: &'a mut SearchBox,
    width: f32,
    style: OverlayStyle,
}

impl<'a> SearchBar<'a> {
    pub fn new(state: &'a mut SearchBox) -> Self {
        Self {
            state,
            width: 360.0,
            style: OverlayStyle::default(),
        }
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }
}

fn pressed_keys(ui: &Ui) -> Vec<SearchKey> {
    ui.input(|i| {
        [
            (Key::ArrowDown, SearchKey::Down),
            (Key::ArrowUp, SearchKey::Up),
            (Key::Enter, SearchKey::Enter),
            (Key::Escape, SearchKey::Escape),
        ]
        .into_iter()
        .filter(|(key, _)| i.key_pressed(*key))
        .map(|(_, search_key)| search_key)
        .collect()
    })
}

impl Widget for SearchBar<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let state = self.state;
        let width = self.width;

        let inner = self.style.card().show(ui, |ui| {
            ui.set_width(width);

            let mut text = state.query().to_string();
            let field = ui.add(
                TextEdit::singleline(&mut text)
                    .hint_text("Search for places...")
                    .desired_width(width),
            );

            if field.changed() {
                state.set_query(text);
            }
            if field.gained_focus() {
                state.focus();
            }

            // Enter makes a single-line edit lose focus, so accept it either way
            if field.has_focus() || field.lost_focus() {
                for key in pressed_keys(ui) {
                    if key == SearchKey::Escape {
                        field.surrender_focus();
                    }
                    state.on_key(key);
                }
            }

            let mut hovered = None;
            let mut clicked = None;
            if state.is_open() {
                ui.separator();
                for (index, suggestion) in state.suggestions().iter().enumerate() {
                    let selected = state.selected() == Some(index);
                    let row = ui.selectable_label(selected, format!("📍 {suggestion}"));
                    if row.hovered() && !selected {
                        hovered = Some(index);
                    }
                    if row.clicked() {
                        clicked = Some(index);
                    }
                }
            }

            if let Some(index) = clicked {
                state.click_suggestion(index);
            } else if let Some(index) = hovered {
                state.hover(index);
            }
            field
        });

        let area = inner.response.rect;
        let clicked_elsewhere = ui.input(|i| {
            i.pointer.any_pressed()
                && i
                    .pointer
                    .interact_pos()
                    .map(|p| !area.contains(p))
                    .unwrap_or(false)
        });
        if clicked_elsewhere && state.is_open() {
            state.click_outside();
        }

        inner.inner
    }
}
