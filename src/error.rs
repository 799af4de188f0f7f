use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("this nickname is already taken")]
    DuplicateName,
    #[error("invalid nickname or password")]
    InvalidCredentials,
    #[error("account storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("account data error: {0}")]
    Format(#[from] serde_json::Error),
}
