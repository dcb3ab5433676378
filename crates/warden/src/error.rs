//! Warden error types.

use thiserror::Error;

/// Boxed error returned by fallible conditions and custom denial handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Warden errors.
///
/// A denied check is not an error: [`Warden::can`](crate::Warden::can)
/// answers `Ok(false)`. Errors only come from enforcement, from a failing
/// condition, or from loading configuration.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The default enforcement failure.
    #[error("{actor} is not allowed to {action} {target}.")]
    NotAuthorized {
        actor: &'static str,
        action: String,
        target: &'static str,
    },

    /// An enforcement failure raised by a custom handler.
    ///
    /// The wrapped error is the handler's own; downcast it to recover the
    /// domain type.
    #[error(transparent)]
    Rejected(BoxError),

    /// A condition failed instead of answering.
    #[error(transparent)]
    Condition(BoxError),

    /// Failed to parse a configuration file.
    #[error("failed to parse config: {0}")]
    Config(String),

    /// An I/O error occurred while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a domain error raised by a custom denial handler.
    pub fn rejected(err: impl Into<BoxError>) -> Self {
        Self::Rejected(err.into())
    }

    /// Whether this error is an enforcement failure, as opposed to a
    /// condition or configuration failure.
    pub fn is_denial(&self) -> bool {
        matches!(self, Error::NotAuthorized { .. } | Error::Rejected(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("forbidden")]
    struct Forbidden;

    #[test]
    fn test_not_authorized_display() {
        let e = Error::NotAuthorized {
            actor: "User",
            action: "delete".to_string(),
            target: "Post",
        };
        assert_eq!(e.to_string(), "User is not allowed to delete Post.");
    }

    #[test]
    fn test_rejected_is_transparent() {
        let e = Error::rejected(Forbidden);
        assert_eq!(e.to_string(), "forbidden");
        let Error::Rejected(inner) = e else {
            panic!("expected Rejected");
        };
        assert!(inner.downcast_ref::<Forbidden>().is_some());
    }

    #[test]
    fn test_is_denial() {
        assert!(Error::rejected(Forbidden).is_denial());
        assert!(!Error::Condition(Box::new(Forbidden)).is_denial());
        assert!(!Error::Config("bad".into()).is_denial());
    }
}
