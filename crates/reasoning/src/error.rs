use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("reasoning API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, Error>;
