use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkPulseError {
    #[error("Input text is empty")]
    EmptyInput,

    #[error("No URLs found in the input text")]
    NoUrlsFound,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
