//! `epicrm` command-line front end over the auth core.

pub mod cli;
pub mod commands;
pub mod context;
pub mod settings;

pub use cli::{Cli, Commands};
pub use context::AppContext;
pub use settings::Settings;
