use std::path::PathBuf;

use async_trait::async_trait;
use fraktum_app_core::{Dialogs, InstallChoice, InstallPrompt};
use fraktum_config::{PRODUCT_NAME, SAVE_EXTENSION};
use rfd::{AsyncFileDialog, AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};

const RESTART_NOW: &str = "Restart now";
const LATER: &str = "Later";

/// Native file choosers.
pub struct RfdDialogs;

#[async_trait]
impl Dialogs for RfdDialogs {
    async fn pick_executable(&self) -> Option<PathBuf> {
        let dialog = AsyncFileDialog::new().set_title("Select game executable");
        #[cfg(windows)]
        let dialog = dialog.add_filter("Executable", &["exe"]);
        dialog
            .pick_file()
            .await
            .map(|file| file.path().to_path_buf())
    }

    async fn pick_save_destination(&self, suggested_name: &str) -> Option<PathBuf> {
        AsyncFileDialog::new()
            .set_title("Export save")
            .set_file_name(suggested_name)
            .save_file()
            .await
            .map(|file| file.path().to_path_buf())
    }

    async fn pick_save_source(&self) -> Option<PathBuf> {
        AsyncFileDialog::new()
            .set_title("Import save")
            .add_filter("Save archive", &[SAVE_EXTENSION])
            .pick_file()
            .await
            .map(|file| file.path().to_path_buf())
    }
}

/// Asks whether to restart into a downloaded update right away.
pub struct RfdInstallPrompt;

#[async_trait]
impl InstallPrompt for RfdInstallPrompt {
    async fn ask(&self, version: &str) -> InstallChoice {
        let answer = AsyncMessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title(PRODUCT_NAME)
            .set_description(format!(
                "Version {version} has been downloaded. Restart now to install it, or it will \
                 be installed when you close the launcher."
            ))
            .set_buttons(MessageButtons::OkCancelCustom(
                RESTART_NOW.to_owned(),
                LATER.to_owned(),
            ))
            .show()
            .await;
        choice_for(&answer)
    }
}

fn choice_for(answer: &MessageDialogResult) -> InstallChoice {
    match answer {
        MessageDialogResult::Ok => InstallChoice::Now,
        MessageDialogResult::Custom(label) if label == RESTART_NOW => InstallChoice::Now,
        _ => InstallChoice::Later,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_restart_answers_install_now() {
        assert_eq!(
            choice_for(&MessageDialogResult::Custom(RESTART_NOW.into())),
            InstallChoice::Now
        );
        assert_eq!(
            choice_for(&MessageDialogResult::Custom(LATER.into())),
            InstallChoice::Later
        );
        assert_eq!(choice_for(&MessageDialogResult::Cancel), InstallChoice::Later);
    }
}
