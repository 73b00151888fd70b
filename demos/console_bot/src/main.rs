//! Console Bot
//!
//! A raid-organizer bot driven from the terminal. Each line you type is a
//! message from you in the bot's only channel.
//!
//! ```text
//! !help                        list commands
//! !attendance tank             sign up
//! [attendance-healer]          click a signup button
//! /attendance class=dps        the same, as a slash command
//! !attendance update Fri 8pm   set the raid note (needs --role Officer)
//! !remind 1 pull the boss      reminder in one minute
//! +bo                          a new member joins
//! <@999>                       mention the bot
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --role Officer
//! ```

mod features;
mod gateway;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use muster::core::{User, UserId};
use muster::runtime::MusterRuntime;
use tokio::sync::mpsc;
use tracing::info;

use crate::features::{Attendance, Greeter, Reminders};
use crate::gateway::{CHANNEL, ConsoleGateway};

#[derive(Parser, Debug)]
#[command(name = "console-bot", about = "Muster raid organizer on the terminal")]
struct Cli {
    /// Configuration file to load instead of searching for muster.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile (development, production, ...).
    #[arg(short, long)]
    profile: Option<String>,

    /// Your user id.
    #[arg(long, default_value_t = 1)]
    user_id: u64,

    /// Your display name.
    #[arg(long, default_value = "you")]
    user_name: String,

    /// A role you hold. Repeat for several.
    #[arg(long = "role")]
    roles: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let me = User {
        id: UserId(cli.user_id),
        name: cli.user_name,
        bot: false,
    };
    let gateway = Arc::new(ConsoleGateway::new(me, &cli.roles));
    let greeter = Arc::new(Greeter::new(CHANNEL));

    let mut builder = MusterRuntime::builder(gateway.clone()).search_path(".");
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder
        .feature(Arc::new(Attendance::default()))
        .feature(Arc::new(Reminders::default()))
        .feature(Arc::clone(&greeter))
        .build()?;

    greeter.set_help(runtime.engine().registry().command_help());
    info!(roles = ?cli.roles, "Type a message, or Ctrl+D to quit");

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(gateway.pump(tx));

    runtime.run(rx).await?;
    Ok(())
}
