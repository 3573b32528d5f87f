//! Engine module: CLI surface, run handler, shared helpers

pub mod arg_parser;
pub mod cli;
pub mod progress;
pub mod tools;

pub use arg_parser::{Cli, Commands, CommonArgs, CopyArgs, ScrapeArgs};
pub use cli::handle_run;
pub use tools::{existing_dir, glob_match, is_os_hidden_file, path_relative_to, should_include_in_walk};
