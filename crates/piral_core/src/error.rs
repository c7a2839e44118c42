use thiserror::Error;

use crate::command::View;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command `{token}` for the {view} command set")]
    UnknownCommand { token: String, view: View },

    #[error("missing required option `--{flag}` for `{command}`")]
    MissingOption { command: String, flag: String },

    #[error("invalid value `{value}` for `--{flag}` (expected one of: {expected})")]
    InvalidChoice {
        flag: String,
        value: String,
        expected: String,
    },

    #[error("options for `{command}` do not match its schema: {source}")]
    InvalidOptions {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CommandError>;
