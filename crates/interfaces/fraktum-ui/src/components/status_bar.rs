use eframe::egui;

use crate::theme::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// The last thing the launcher wants the user to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

pub fn show(ui: &mut egui::Ui, notice: Option<&Notice>, root: &str) {
    ui.horizontal(|ui| {
        match notice {
            Some(notice) => {
                let color = match notice.kind {
                    NoticeKind::Info => COL_TEXT,
                    NoticeKind::Success => COL_SUCCESS,
                    NoticeKind::Error => COL_DANGER,
                };
                ui.label(egui::RichText::new(&notice.text).small().color(color));
            }
            None => {
                ui.label(egui::RichText::new("Ready").small().color(COL_TEXT_DIM));
            }
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(egui::RichText::new(root).small().color(COL_TEXT_DIM));
        });
    });
}
