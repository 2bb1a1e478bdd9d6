use std::collections::HashSet;
use std::future::Future;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use eframe::egui;
use fraktum_app_core::{
    runtime, CapabilityBridge, DownloadBuildRequest, LauncherImpl, Reason, Reply, UpdateEvents,
};
use fraktum_core::{ExecutableInfo, LaunchRequest, StatusPayload, UpdateEvent, UpdateProgress};
use fraktum_infra::{DownloadEvent, FocusRequests, VelopackFeed};
use tracing::{debug, error};

use crate::components::header::{self, HeaderModel};
use crate::components::status_bar::{self, Notice};
use crate::dialogs::RfdDialogs;
use crate::theme::*;
use crate::utils::{cmd_button, section, ButtonStyle};

type DesktopBridge = CapabilityBridge<LauncherImpl, RfdDialogs, VelopackFeed>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Task {
    SelectExecutable,
    Launch,
    SaveUpload,
    SaveExport,
    Install,
    BuildDownload,
}

enum AppMessage {
    Focus,
    Update(UpdateEvent),
    Executable(Option<ExecutableInfo>),
    Build(DownloadEvent),
    Notice(Notice),
    Finished(Task),
}

/// Hands messages from background tasks to the frame loop and wakes it up.
#[derive(Clone)]
struct Mailbox {
    tx: Sender<AppMessage>,
    ctx: egui::Context,
}

impl Mailbox {
    fn post(&self, message: AppMessage) {
        if self.tx.send(message).is_ok() {
            self.ctx.request_repaint();
        }
    }
}

#[derive(Default)]
struct Form {
    game_id: String,
    args: String,
    slot: String,
    build_url: String,
    build_version: String,
}

#[derive(Default)]
struct BuildProgress {
    received: u64,
    total: Option<u64>,
}

pub struct LauncherApp {
    bridge: Arc<DesktopBridge>,
    mailbox: Mailbox,
    inbox: Receiver<AppMessage>,
    app_version: String,
    executable: Option<ExecutableInfo>,
    update_status: Option<StatusPayload>,
    update_progress: Option<UpdateProgress>,
    build_progress: Option<BuildProgress>,
    form: Form,
    busy: HashSet<Task>,
    notice: Option<Notice>,
}

impl LauncherApp {
    pub fn new(ctx: egui::Context, bridge: Arc<DesktopBridge>, focus: FocusRequests) -> Self {
        let (tx, inbox) = mpsc::channel();
        let mailbox = Mailbox { tx, ctx };
        let app = Self {
            app_version: bridge.app_version().to_owned(),
            bridge,
            mailbox,
            inbox,
            executable: None,
            update_status: None,
            update_progress: None,
            build_progress: None,
            form: Form::default(),
            busy: HashSet::new(),
            notice: None,
        };

        app.forward_focus(focus);
        if let Some(events) = app.bridge.take_events() {
            app.forward_updates(events);
        }

        let bridge = app.bridge.clone();
        app.run_background(async move { AppMessage::Executable(bridge.get_executable().await) });
        app
    }

    fn forward_focus(&self, mut focus: FocusRequests) {
        let mailbox = self.mailbox.clone();
        self.spawn_detached(async move {
            while focus.next().await.is_some() {
                mailbox.post(AppMessage::Focus);
            }
        });
    }

    fn forward_updates(&self, mut events: UpdateEvents) {
        let mailbox = self.mailbox.clone();
        self.spawn_detached(async move {
            while let Some(event) = events.recv().await {
                mailbox.post(AppMessage::Update(event));
            }
        });
    }

    fn spawn_detached(&self, fut: impl Future<Output = ()> + Send + 'static) {
        match runtime() {
            Ok(rt) => {
                rt.spawn(fut);
            }
            Err(e) => {
                error!("No async runtime: {e}");
                self.mailbox.post(AppMessage::Notice(Notice::error(format!(
                    "Internal error: {e}"
                ))));
            }
        }
    }

    /// Runs `fut` on the shared runtime and posts its result.
    fn run_background<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = AppMessage> + Send + 'static,
    {
        let mailbox = self.mailbox.clone();
        self.spawn_detached(async move {
            let message = fut.await;
            mailbox.post(message);
        });
    }

    /// Like [`Self::run_background`], but marks `task` busy until it finishes.
    fn start<Fut>(&mut self, task: Task, fut: Fut)
    where
        Fut: Future<Output = AppMessage> + Send + 'static,
    {
        if !self.busy.insert(task) {
            return;
        }
        let mailbox = self.mailbox.clone();
        self.run_background(async move {
            let message = fut.await;
            mailbox.post(message);
            AppMessage::Finished(task)
        });
    }

    fn is_busy(&self, task: Task) -> bool {
        self.busy.contains(&task)
    }

    fn handle_messages(&mut self, ctx: &egui::Context) {
        while let Ok(message) = self.inbox.try_recv() {
            match message {
                AppMessage::Focus => {
                    debug!("Focus requested by a second launch");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
                    ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
                }
                AppMessage::Update(UpdateEvent::Status(status)) => {
                    self.update_progress = None;
                    self.update_status = Some(status);
                }
                AppMessage::Update(UpdateEvent::Progress(progress)) => {
                    self.update_progress = Some(progress);
                }
                AppMessage::Executable(info) => {
                    if info.is_some() {
                        self.executable = info;
                    }
                }
                AppMessage::Build(event) => self.apply_build_event(event),
                AppMessage::Notice(notice) => self.notice = Some(notice),
                AppMessage::Finished(task) => {
                    self.busy.remove(&task);
                    if task == Task::BuildDownload {
                        self.build_progress = None;
                    }
                }
            }
        }
    }

    fn apply_build_event(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Started { total_bytes } => {
                self.build_progress = Some(BuildProgress {
                    received: 0,
                    total: total_bytes,
                });
            }
            DownloadEvent::Progress { bytes_delta } => {
                if let Some(progress) = &mut self.build_progress {
                    progress.received += bytes_delta;
                }
            }
            DownloadEvent::Completed { .. } => {}
        }
    }

    // --- Actions ---

    fn check_updates(&mut self) {
        match self.bridge.update_check() {
            Reply::Ok(_) => self.notice = Some(Notice::info("Checking for updates")),
            Reply::Err(failure) => self.notice = Some(Notice::info(failure.to_string())),
        }
    }

    fn install_update(&mut self) {
        let bridge = self.bridge.clone();
        self.start(Task::Install, async move {
            match bridge.update_quit_and_install().await {
                Reply::Ok(_) => AppMessage::Notice(Notice::info("Installing update")),
                Reply::Err(failure) => AppMessage::Notice(Notice::error(failure.to_string())),
            }
        });
    }

    fn select_executable(&mut self) {
        let bridge = self.bridge.clone();
        self.start(Task::SelectExecutable, async move {
            AppMessage::Executable(bridge.select_executable().await)
        });
    }

    fn launch(&mut self) {
        let Some(args) = shlex::split(&self.form.args) else {
            self.notice = Some(Notice::error("Arguments have unbalanced quotes"));
            return;
        };
        let request = LaunchRequest::new(self.form.game_id.trim(), args);
        let bridge = self.bridge.clone();
        self.start(Task::Launch, async move {
            match bridge.run_game(request).await {
                Reply::Ok(launched) => {
                    AppMessage::Notice(Notice::success(format!("Started {}", launched.game_id)))
                }
                Reply::Err(failure) => AppMessage::Notice(Notice::error(failure.to_string())),
            }
        });
    }

    fn import_save(&mut self) {
        let slot = self.form.slot.trim().to_owned();
        let bridge = self.bridge.clone();
        self.start(Task::SaveUpload, async move {
            match bridge.save_import(&slot).await {
                Reply::Ok(stored) => {
                    AppMessage::Notice(Notice::success(format!("Stored {}", stored.file)))
                }
                Reply::Err(failure) if failure.reason == Some(Reason::Cancel) => {
                    AppMessage::Notice(Notice::info("Import cancelled"))
                }
                Reply::Err(failure) => AppMessage::Notice(Notice::error(failure.to_string())),
            }
        });
    }

    fn export_save(&mut self) {
        let slot = self.form.slot.trim().to_owned();
        let bridge = self.bridge.clone();
        self.start(Task::SaveExport, async move {
            match bridge.save_download(&slot).await {
                Reply::Ok(exported) => AppMessage::Notice(Notice::success(format!(
                    "Exported to {}",
                    exported.file_path
                ))),
                Reply::Err(failure) => AppMessage::Notice(Notice::error(failure.to_string())),
            }
        });
    }

    fn download_build(&mut self) {
        let version = self.form.build_version.trim();
        let request = DownloadBuildRequest {
            game_id: self.form.game_id.trim().to_owned(),
            url: self.form.build_url.trim().to_owned(),
            version: (!version.is_empty()).then(|| version.to_owned()),
        };
        let bridge = self.bridge.clone();
        let mailbox = self.mailbox.clone();
        self.start(Task::BuildDownload, async move {
            let (tx, mut rx) = tokio::sync::mpsc::channel(64);
            let forward = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    mailbox.post(AppMessage::Build(event));
                }
            });
            let reply = bridge
                .download_game_build_with_progress(request, Some(tx))
                .await;
            let _ = forward.await;
            match reply {
                Reply::Ok(build) => {
                    AppMessage::Notice(Notice::success(format!("Build saved to {}", build.dir)))
                }
                Reply::Err(failure) => AppMessage::Notice(Notice::error(failure.to_string())),
            }
        });
    }

    // --- Sections ---

    fn game_section(&mut self, ui: &mut egui::Ui) {
        section(ui, "GAME", |ui| {
            ui.horizontal(|ui| {
                match &self.executable {
                    Some(exe) => {
                        ui.label(egui::RichText::new(&exe.name).color(COL_TEXT).strong());
                        ui.label(egui::RichText::new(&exe.path).small().color(COL_TEXT_DIM));
                    }
                    None => {
                        ui.label(egui::RichText::new("No executable selected").color(COL_WARN));
                    }
                }
            });

            ui.horizontal(|ui| {
                ui.label("Game ID");
                ui.text_edit_singleline(&mut self.form.game_id);
            });
            ui.horizontal(|ui| {
                ui.label("Args   ");
                ui.text_edit_singleline(&mut self.form.args);
            });

            ui.horizontal(|ui| {
                let pick = cmd_button(
                    ui,
                    "SELECT EXECUTABLE",
                    ButtonStyle::Outline,
                    !self.is_busy(Task::SelectExecutable),
                );
                if pick.clicked() {
                    self.select_executable();
                }

                let can_play = self.executable.is_some() && !self.is_busy(Task::Launch);
                if cmd_button(ui, "PLAY", ButtonStyle::Primary, can_play).clicked() {
                    self.launch();
                }
            });
        });
    }

    fn saves_section(&mut self, ui: &mut egui::Ui) {
        section(ui, "SAVES", |ui| {
            ui.horizontal(|ui| {
                ui.label("Slot");
                ui.text_edit_singleline(&mut self.form.slot);
            });

            let has_slot = !self.form.slot.trim().is_empty();
            ui.horizontal(|ui| {
                let import = cmd_button(
                    ui,
                    "IMPORT",
                    ButtonStyle::Outline,
                    has_slot && !self.is_busy(Task::SaveUpload),
                );
                if import.clicked() {
                    self.import_save();
                }

                let export = cmd_button(
                    ui,
                    "EXPORT",
                    ButtonStyle::Outline,
                    has_slot && !self.is_busy(Task::SaveExport),
                );
                if export.clicked() {
                    self.export_save();
                }
            });
        });
    }

    fn builds_section(&mut self, ui: &mut egui::Ui) {
        section(ui, "BUILDS", |ui| {
            ui.horizontal(|ui| {
                ui.label("URL    ");
                ui.text_edit_singleline(&mut self.form.build_url);
            });
            ui.horizontal(|ui| {
                ui.label("Version");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.build_version)
                        .hint_text(fraktum_config::LATEST_BUILD_DIR),
                );
            });

            let ready = !self.form.game_id.trim().is_empty()
                && !self.form.build_url.trim().is_empty()
                && !self.is_busy(Task::BuildDownload);
            ui.horizontal(|ui| {
                if cmd_button(ui, "DOWNLOAD BUILD", ButtonStyle::Outline, ready).clicked() {
                    self.download_build();
                }
                if let Some(progress) = &self.build_progress {
                    let bar = match progress.total {
                        Some(total) if total > 0 => {
                            egui::ProgressBar::new(progress.received as f32 / total as f32)
                                .show_percentage()
                        }
                        _ => egui::ProgressBar::new(0.0)
                            .text(format!("{} bytes", progress.received))
                            .animate(true),
                    };
                    ui.add(bar.desired_width(ui.available_width()));
                }
            });
        });
    }
}

impl eframe::App for LauncherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_messages(ctx);

        let header = egui::TopBottomPanel::top("header")
            .show(ctx, |ui| {
                header::show(
                    ui,
                    &HeaderModel {
                        version: &self.app_version,
                        platform: self.bridge.platform(),
                        status: self.update_status.as_ref(),
                        progress: self.update_progress,
                        installing: self.is_busy(Task::Install),
                    },
                )
            })
            .inner;
        if header.check_updates {
            self.check_updates();
        }
        if header.install_update {
            self.install_update();
        }

        let root = self.bridge.profile_root().display().to_string();
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            status_bar::show(ui, self.notice.as_ref(), &root);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.game_section(ui);
                self.saves_section(ui);
                self.builds_section(ui);
            });
        });
    }
}
