use eframe::egui::{self, Color32};
use fraktum_core::{StatusPayload, StatusPhase, UpdateProgress};

use crate::theme::*;
use crate::utils::{cmd_button, ButtonStyle};

pub struct HeaderModel<'a> {
    pub version: &'a str,
    pub platform: &'a str,
    pub status: Option<&'a StatusPayload>,
    pub progress: Option<UpdateProgress>,
    pub installing: bool,
}

#[derive(Default)]
pub struct HeaderResponse {
    pub check_updates: bool,
    pub install_update: bool,
}

pub fn show(ui: &mut egui::Ui, model: &HeaderModel<'_>) -> HeaderResponse {
    let mut response = HeaderResponse::default();

    ui.horizontal(|ui| {
        ui.heading(egui::RichText::new("FRAKTUM").color(COL_ACCENT).strong());
        ui.label(
            egui::RichText::new(format!("v{} // {}", model.version, model.platform))
                .small()
                .color(COL_TEXT_DIM),
        );

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let downloaded = matches!(
                model.status.map(|s| s.phase),
                Some(StatusPhase::Downloaded)
            );
            if downloaded {
                response.install_update = cmd_button(
                    ui,
                    "RESTART TO UPDATE",
                    ButtonStyle::Primary,
                    !model.installing,
                )
                .clicked();
            } else {
                response.check_updates = cmd_button(
                    ui,
                    "CHECK FOR UPDATES",
                    ButtonStyle::Outline,
                    can_check(model.status),
                )
                .clicked();
            }

            if let Some((text, color)) = update_label(model.status, model.progress) {
                ui.label(egui::RichText::new(text).small().color(color));
            }
        });
    });

    response
}

fn can_check(status: Option<&StatusPayload>) -> bool {
    match status.map(|s| s.phase) {
        None | Some(StatusPhase::NoUpdate) | Some(StatusPhase::Error) => true,
        Some(StatusPhase::Checking | StatusPhase::Available | StatusPhase::Downloaded) => false,
    }
}

/// Short status line for the latest update event.
pub fn update_label(
    status: Option<&StatusPayload>,
    progress: Option<UpdateProgress>,
) -> Option<(String, Color32)> {
    let status = status?;
    let version = status.version.as_deref().unwrap_or("?");
    let label = match status.phase {
        StatusPhase::Checking => ("Checking for updates...".to_owned(), COL_TEXT_DIM),
        StatusPhase::Available => match progress {
            Some(p) => (format!("Downloading {version}: {}%", p.percent), COL_WARN),
            None => (format!("Update {version} available"), COL_WARN),
        },
        StatusPhase::NoUpdate => ("Up to date".to_owned(), COL_SUCCESS),
        StatusPhase::Downloaded => (format!("Update {version} ready"), COL_SUCCESS),
        StatusPhase::Error => (
            format!(
                "Update failed: {}",
                status.error.as_deref().unwrap_or("unknown error")
            ),
            COL_DANGER,
        ),
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraktum_core::UpdateEvent;

    fn payload(event: UpdateEvent) -> StatusPayload {
        match event {
            UpdateEvent::Status(status) => status,
            UpdateEvent::Progress(_) => unreachable!(),
        }
    }

    #[test]
    fn progress_shows_while_an_update_downloads() {
        let status = payload(UpdateEvent::available("2.0.0"));
        let (text, _) =
            update_label(Some(&status), Some(UpdateProgress::from_percent(40, 100))).unwrap();
        assert_eq!(text, "Downloading 2.0.0: 40%");
    }

    #[test]
    fn checks_are_offered_only_outside_a_cycle() {
        assert!(can_check(None));
        assert!(can_check(Some(&payload(UpdateEvent::error("offline")))));
        assert!(!can_check(Some(&payload(UpdateEvent::checking()))));
        assert!(!can_check(Some(&payload(UpdateEvent::downloaded("2.0.0")))));
    }

    #[test]
    fn errors_carry_their_message() {
        let status = payload(UpdateEvent::error("offline"));
        let (text, color) = update_label(Some(&status), None).unwrap();
        assert_eq!(text, "Update failed: offline");
        assert_eq!(color, COL_DANGER);
    }
}
