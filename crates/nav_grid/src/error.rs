//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, misuse of unbuilt graphs, registry exhaustion, and
//! ring-search overflow diagnostics.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("graph has not been built")]
    NotBuilt,

    #[error("graph registry is full")]
    RegistryFull,

    #[error("ring search exceeded the hard radius cap at radius {radius}")]
    SearchOverflow { radius: i32 },

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "boom"));
    }

    #[test]
    fn invalid_config_displays_message() {
        let err = Error::InvalidConfig("cell_size must be > 0".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: cell_size must be > 0"
        );
    }
}
