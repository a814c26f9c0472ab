use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Username not found: {0}")]
    UsernameNotFound(String),
}
