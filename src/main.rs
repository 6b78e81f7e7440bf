use clap::Parser;
use commands::{Commands, FieldArgs};
use config::{ConfigStore, DEFAULT_CONFIG_PATH};
use crate::core::AppState;
use git::GitVcs;
use std::path::PathBuf;

mod commands;
mod config;
mod core;
mod errors;
mod git;
mod sync;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "repo-sync")]
#[command(
    about = "Clone a repository twice, copy one working tree over the other and commit it on a new branch",
    long_about = None
)]
struct Cli {
    /// File the field values are loaded from and saved to
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(flatten)]
    fields: FieldArgs,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    env_logger::init();

    let args = Cli::parse();

    let store = ConfigStore::new(args.config);
    let mut config = store.load();
    args.fields.apply(&mut config);

    let vcs = GitVcs::new();
    let mut state = AppState::new(config);
    state.attach_existing(&vcs);

    if !args.command.execute(&vcs, &store, &mut state) {
        std::process::exit(1);
    }
}
