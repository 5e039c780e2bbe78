pub mod commands;
pub mod middleware;
pub mod registry;

use std::path::PathBuf;

use clap::Parser;

pub use middleware::{logged_in, AuthedHandler, LoggedIn};
pub use registry::{Command, CommandHandler, Commands};

#[derive(Parser)]
#[command(name = "gator")]
#[command(about = "A multi-user RSS feed aggregator", long_about = None)]
#[command(after_help = "Commands: register, login, reset, users, agg, scrape, addfeed, feeds, follow, following, unfollow, browse")]
pub struct Cli {
    /// Config file to use instead of ~/.gatorconfig.json
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Command to run
    pub command: String,

    /// Arguments for the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    pub fn to_command(&self) -> Command {
        Command::new(&self.command, self.args.clone())
    }
}
