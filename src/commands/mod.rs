pub mod shell;
pub mod show;

use crate::{
    config::{ConfigStore, WorkflowConfig},
    core::{perform, run_all, Action, AppState, Notification, Side},
    git::Vcs,
};
use clap::{Args, Subcommand};

/// The six fields, each overriding the saved value for this invocation
#[derive(Debug, Default, Args)]
pub struct FieldArgs {
    /// Directory to clone into, the second clone goes to <DIR>_copy
    #[arg(long = "dir", global = true)]
    pub directory_name: Option<String>,

    /// URL of the repository to clone
    #[arg(long = "url", global = true)]
    pub git_url: Option<String>,

    /// Branch to check out in the first clone
    #[arg(long, global = true)]
    pub source_branch: Option<String>,

    /// Branch to check out in the second clone
    #[arg(long, global = true)]
    pub target_branch: Option<String>,

    /// Branch to create in the second clone
    #[arg(long, global = true)]
    pub new_branch: Option<String>,

    /// Commit message
    #[arg(short = 'm', long = "message", global = true)]
    pub commit_message: Option<String>,
}

impl FieldArgs {
    pub fn apply(self, config: &mut WorkflowConfig) {
        let overrides = [
            (self.directory_name, &mut config.directory_name),
            (self.git_url, &mut config.git_url),
            (self.source_branch, &mut config.source_branch),
            (self.target_branch, &mut config.target_branch),
            (self.new_branch, &mut config.new_branch),
            (self.commit_message, &mut config.commit_message),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clone the URL into <DIR> and <DIR>_copy
    Clone,
    /// Switch one of the clones to the branch from its field
    Checkout {
        #[arg(value_enum)]
        side: Side,
    },
    /// Copy the first clone's files over the second clone
    Sync,
    /// Create the new branch in the second clone and switch to it
    Branch,
    /// Commit everything in the second clone and push it
    Commit,
    /// Save the field values
    Save,
    /// Show the field values and the clones
    Show,
    /// Clone, check out, sync, branch and commit in one go
    Run,
    /// Read commands from stdin, keeping the clones between commands
    Shell,
}

impl Commands {
    /// Run the command, returns whether it succeeded
    pub fn execute<V: Vcs>(self, vcs: &V, store: &ConfigStore, state: &mut AppState) -> bool {
        let action = match self {
            Commands::Clone => Action::Clone,
            Commands::Checkout { side } => Action::Checkout(side),
            Commands::Sync => Action::SyncContents,
            Commands::Branch => Action::CreateBranch,
            Commands::Commit => Action::CommitAndPush,
            Commands::Save => Action::PersistConfig,
            Commands::Show => {
                print!("{}", show::describe(state));
                return true;
            }
            Commands::Run => return run_all(vcs, store, state, report),
            Commands::Shell => {
                let stdin = std::io::stdin();
                let stdout = std::io::stdout();
                return match shell::run(vcs, store, state, stdin.lock(), stdout.lock()) {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!("Shell stopped: {}", e);
                        false
                    }
                };
            }
        };

        let notification = perform(action, vcs, store, state);
        report(&notification);
        !notification.is_error()
    }
}

/// Print a notification, errors on stderr
pub fn report(notification: &Notification) {
    if notification.is_error() {
        eprintln!("{}", notification);
    } else {
        println!("{}", notification);
    }
}
