use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fraktum_app_core::{DownloadBuildRequest, HostOptions};
use fraktum_cli::{build_host, commands};
use fraktum_config::DATA_DIR_ENV;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Named profile to operate on
    #[arg(short, long, global = true)]
    profile: Option<String>,
    /// Base directory profiles are resolved against
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the game executable
    Exe {
        #[command(subcommand)]
        command: ExeCommands,
    },
    /// Start the configured executable
    Run {
        game_id: String,
        #[arg(long, default_value = "")]
        args: String,
    },
    /// Store and export save slots
    Save {
        #[command(subcommand)]
        command: SaveCommands,
    },
    /// Check for, download and stage a launcher update
    #[command(name = "check-for-updates", alias = "check")]
    CheckForUpdates,
    /// Download a game build archive into the profile
    Build {
        game_id: String,
        url: String,
        #[arg(long)]
        version: Option<String>,
    },
    /// Send a raw JSON bridge request
    Invoke { request: String },
    /// Print version, platform and profile location
    Info,
}

#[derive(Subcommand)]
enum ExeCommands {
    Show,
    Set { path: PathBuf },
}

#[derive(Subcommand)]
enum SaveCommands {
    Upload { slot: String, file: PathBuf },
    Download { slot: String, dest: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let (host, dialogs) = build_host(&HostOptions {
        profile: cli.profile,
        data_dir: cli.data_dir,
    })?;
    let bridge = host.bridge().as_ref();

    let result = match cli.command {
        Commands::Exe { command } => match command {
            ExeCommands::Show => commands::cmd_exe_show(bridge).await.map(drop),
            ExeCommands::Set { path } => {
                commands::cmd_exe_set(bridge, &dialogs, path).await.map(drop)
            }
        },
        Commands::Run { game_id, args } => {
            commands::cmd_run(bridge, game_id, &args).await.map(drop)
        }
        Commands::Save { command } => match command {
            SaveCommands::Upload { slot, file } => {
                commands::cmd_save_upload(bridge, &dialogs, &slot, file).await.map(drop)
            }
            SaveCommands::Download { slot, dest } => {
                commands::cmd_save_download(bridge, &dialogs, &slot, dest).await.map(drop)
            }
        },
        Commands::CheckForUpdates => commands::cmd_update_check(bridge).await.map(drop),
        Commands::Build {
            game_id,
            url,
            version,
        } => commands::cmd_build_download(
            bridge,
            DownloadBuildRequest {
                game_id,
                url,
                version,
            },
        )
        .await
        .map(drop),
        Commands::Invoke { request } => commands::cmd_invoke(bridge, &request).await.map(drop),
        Commands::Info => {
            commands::cmd_info(bridge);
            Ok(())
        }
    };

    host.shutdown();
    result
}
