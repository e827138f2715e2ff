use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid holiday date `{raw}`: {source}")]
    InvalidDate {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("holiday range `{raw}` ends before it starts")]
    InvertedRange { raw: String },

    #[error("unknown relay profile `{0}` (expected `echo` or `assistant`)")]
    UnknownProfile(String),
}
