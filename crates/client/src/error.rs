//! Client-side error type.
//!
//! Only construction can fail from the caller's point of view: transport
//! failures are expressed through the status channel, never returned from
//! `send()`.

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("config: {0}")]
    Config(String),
}
