use super::{ColumnDescriptor, Renderable};
use eframe::egui;
use serde_json::Value;

const CIRCLE_SIZE: f32 = 12.0;

/// Renders `rows × columns` with an egui grid.
pub struct GridView<'a> {
    id: &'a str,
    rows: &'a [Value],
    columns: &'a [ColumnDescriptor],
    no_data_text: &'a str,
}

/// What happened while the grid was drawn.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GridResponse {
    pub activated: usize,
}

impl<'a> GridView<'a> {
    pub fn new(id: &'a str, rows: &'a [Value], columns: &'a [ColumnDescriptor]) -> Self {
        Self {
            id,
            rows,
            columns,
            no_data_text: "",
        }
    }

    pub fn no_data_text(mut self, text: &'a str) -> Self {
        self.no_data_text = text;
        self
    }

    pub fn show(self, ui: &mut egui::Ui) -> GridResponse {
        let mut response = GridResponse::default();
        if self.rows.is_empty() {
            ui.label(egui::RichText::new(self.no_data_text).weak());
            return response;
        }
        egui::Grid::new(self.id)
            .striped(true)
            .num_columns(self.columns.len())
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                for record in self.rows {
                    for column in self.columns {
                        let cell = column.render(record);
                        render_cell(ui, &cell, &mut response);
                    }
                    ui.end_row();
                }
            });
        response
    }
}

fn render_cell(ui: &mut egui::Ui, cell: &Renderable, response: &mut GridResponse) {
    match cell {
        Renderable::Label { text, style } => {
            ui.label(styled_text(text, style.as_deref()));
        }
        Renderable::ColorCircle { color } => {
            let fill = color
                .as_deref()
                .and_then(parse_hex_color)
                .unwrap_or(egui::Color32::GRAY);
            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(CIRCLE_SIZE, CIRCLE_SIZE), egui::Sense::hover());
            ui.painter()
                .circle_filled(rect.center(), CIRCLE_SIZE / 2.0, fill);
        }
        Renderable::Group { style, items } => {
            let mut body = |ui: &mut egui::Ui| {
                for item in items {
                    render_cell(ui, item, response);
                }
            };
            if style.as_deref() == Some("center") {
                ui.vertical_centered(|ui| body(ui));
            } else {
                ui.vertical(|ui| body(ui));
            }
        }
        Renderable::Button(button) => {
            if ui.small_button(&button.label).clicked() {
                button.activate();
                response.activated += 1;
            }
        }
        Renderable::StatusLabel { text } => {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("✔").color(egui::Color32::from_rgb(0, 150, 70)));
                ui.label(text);
            });
        }
    }
}

fn styled_text(text: &str, style: Option<&str>) -> egui::RichText {
    let rich = egui::RichText::new(text);
    match style {
        Some("highlight") => rich.strong(),
        Some("sub-text") => rich.small().weak(),
        _ => rich,
    }
}

/// Parse `#rrggbb` or `#rgb`.
pub fn parse_hex_color(input: &str) -> Option<egui::Color32> {
    let hex = input.trim().strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some(egui::Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}
