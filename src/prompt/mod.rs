//! Interactive resolution of run parameters
//!
//! A value passed on the command line is accepted when the relevant table
//! knows it; anything else falls back to a prompt loop over a numbered menu.

pub mod console;
pub mod menu;
pub mod resolver;

pub use console::{Console, TerminalConsole};
pub use resolver::{Question, Resolver, ResponseType};

/// Answer that aborts the run at any prompt that allows quitting
pub const QUIT_TOKEN: &str = "q";
