//! Input errors
//!
//! Every failure the descriptor builder can report is an invalid input.
//! Once a parameter set validates, record construction cannot fail.

use thiserror::Error;

/// Invalid template input. Each variant names the offending field and the
/// rule it broke.
#[derive(Error, Debug)]
pub enum InvalidInput {
    #[error("missing required property `{0}`")]
    MissingProperty(&'static str),

    #[error("missing required environment value `{0}`")]
    MissingEnvironment(&'static str),

    #[error("property `name` must be at most {max} characters long, got {len}")]
    NameTooLong { len: usize, max: usize },

    #[error("property `resource` is invalid: {0}")]
    InvalidScope(String),

    #[error("property `{field}` must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("property `{field}` must be a boolean or one of \"True\"/\"False\", got {value:?}")]
    InvalidBool { field: &'static str, value: String },

    #[error("property `{field}` must be an integer, got {value:?}")]
    InvalidInteger { field: &'static str, value: String },

    #[error("property `{field}` could not be decoded: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, InvalidInput>;
