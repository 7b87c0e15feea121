// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("No user is logged in")]
    NotLoggedIn,
    #[error("Not permitted: {0}")]
    Forbidden(String),
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("Validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Reservation {0} not found")]
    NotFound(u64),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Reservation error: {0}")]
    Reservation(#[from] ReservationError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("TUI error: {0}")]
    Tui(#[from] TuiError),
    #[error("CLI error: {0}")]
    Cli(String),
}

pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;
