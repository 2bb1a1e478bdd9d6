use crate::theme::*;
use eframe::egui;
use eframe::egui::Color32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Outline,
    Danger,
}

pub fn section_label(ui: &mut egui::Ui, text: &str) {
    ui.label(
        egui::RichText::new(text)
            .size(10.0)
            .color(COL_TEXT_DIM)
            .family(egui::FontFamily::Monospace)
            .strong(),
    );
}

pub fn cmd_button(
    ui: &mut egui::Ui,
    label: &str,
    style: ButtonStyle,
    enabled: bool,
) -> egui::Response {
    let (fill, stroke_col, text_col) = match style {
        ButtonStyle::Primary => (COL_ACCENT, COL_ACCENT, COL_BG_DARK),
        ButtonStyle::Danger => (Color32::TRANSPARENT, COL_DANGER, COL_DANGER),
        ButtonStyle::Outline => (Color32::TRANSPARENT, COL_ACCENT, COL_ACCENT),
    };

    let text = egui::RichText::new(label)
        .size(11.0)
        .color(if enabled { text_col } else { COL_TEXT_DIM });

    let btn = egui::Button::new(text)
        .min_size(egui::vec2(96.0, 24.0))
        .fill(if enabled { fill } else { Color32::TRANSPARENT })
        .stroke(egui::Stroke::new(
            1.0,
            if enabled { stroke_col } else { COL_BORDER },
        ));

    ui.add_enabled(enabled, btn)
}

/// A bordered block with a small caption, used for each launcher section.
pub fn section<R>(
    ui: &mut egui::Ui,
    title: &str,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> R {
    egui::Frame::new()
        .stroke(egui::Stroke::new(1.0, COL_BORDER))
        .fill(COL_BG_DARK)
        .inner_margin(egui::Margin::same(10))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            section_label(ui, title);
            add_contents(ui)
        })
        .inner
}
