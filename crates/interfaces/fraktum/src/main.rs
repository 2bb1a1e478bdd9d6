#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

use clap::Parser;
use fraktum_app_core::HostOptions;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Keep config, saves and builds in a separate named profile
    #[arg(long)]
    profile: Option<String>,
    /// Base directory for profiles (defaults to the platform data directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() {
    velopack::VelopackApp::build().run();

    let args = Args::parse();
    let options = HostOptions {
        profile: args.profile,
        data_dir: args.data_dir,
    };

    if let Err(err) = fraktum_ui::run(options) {
        eprintln!("Fraktum failed: {err:#}");
        std::process::exit(1);
    }
}
