use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum Command {
    Post,
    Fetch,
    Login,
    Register,
}

#[derive(Parser, Debug, Default)]
#[command(
    about = concat!(env!("CARGO_CRATE_NAME"), " - terminal client for agora"),
    disable_help_flag = true
)]
pub struct Flags {
    /// run one command instead of the interactive feed
    pub command: Option<Command>,
}

impl Flags {
    /// Parse from `std::env::args_os()`, exit on error.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Check if the command is "post"
    pub fn post(&self) -> bool {
        matches!(self.command, Some(Command::Post))
    }

    /// Check if the command is "fetch"
    pub fn fetch(&self) -> bool {
        matches!(self.command, Some(Command::Fetch))
    }

    /// Check if the command is "login"
    pub fn login(&self) -> bool {
        matches!(self.command, Some(Command::Login))
    }

    /// Check if the command is "register"
    pub fn register(&self) -> bool {
        matches!(self.command, Some(Command::Register))
    }
}
