use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::export::ExportFormat;

#[derive(Debug, Parser)]
#[command(name = "tempmail", version, about = "Disposable inbox client with a durable mirror")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Account(AccountArgs),
    List(ListArgs),
    Get(GetArgs),
    Read(MessageIdArgs),
    Rm(MessageIdArgs),
    Watch(WatchArgs),
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    Domains,
    Create(CreateArgs),
    Login(LoginArgs),
    Ls,
    Switch(SwitchArgs),
    Status,
    Logout(LogoutArgs),
    Delete,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long, help = "Local part of the new address (random when omitted)")]
    pub username: Option<String>,
    #[arg(long, help = "Domain to register under (first active domain when omitted)")]
    pub domain: Option<String>,
    #[arg(long, help = "Account password (random when omitted)")]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long, help = "Mailbox address")]
    pub address: String,
    #[arg(long, help = "Mailbox password (prompted when omitted)")]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct SwitchArgs {
    #[arg(help = "Stored account address to activate")]
    pub address: String,
}

#[derive(Debug, Args)]
pub struct LogoutArgs {
    #[arg(long, help = "Also forget every stored account")]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1, help = "Provider page to fetch")]
    pub page: u32,
    #[arg(long, help = "Messages per provider page")]
    pub limit: Option<u32>,
    #[arg(long, help = "Filter the merged view by free text")]
    pub q: Option<String>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[arg(help = "Message id")]
    pub id: String,
    #[arg(long, help = "Do not mark the message as read")]
    pub peek: bool,
}

#[derive(Debug, Args)]
pub struct MessageIdArgs {
    #[arg(help = "Message id")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[arg(long, help = "Seconds between refreshes")]
    pub interval: Option<u64>,
    #[arg(long, help = "Filter the merged view by free text")]
    pub q: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(long, value_enum, help = "Export format")]
    pub format: ExportFormat,
    #[arg(long, help = "Output file (defaults to emails_<timestamp>.<ext>)")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "Only export messages matching this text")]
    pub q: Option<String>,
}
