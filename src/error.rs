use std::borrow::Cow;

/// Errors raised by wire clients while emitting. These are passed through the
/// gateway untouched.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A stat name failed validation. The dispatcher turns this into a logged
/// no-op, it never reaches callers of the gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidName {
    #[error("the stat name ({name}) has to be less than {max_length} characters")]
    TooLong { name: String, max_length: usize },
    #[error("the stat name ({name}) contains {character:?}, only ascii letters, digits, '_', '.' and '-' are allowed")]
    DisallowedCharacter { name: String, character: char },
    /// Raised by custom name handlers.
    #[error("invalid stat name ({name}): {reason}")]
    Rejected {
        name: String,
        reason: Cow<'static, str>,
    },
}

/// Deployment misconfiguration. Unlike [`BackendUnavailable`] this is never
/// papered over with a noop backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config key {key} must be a boolean, got {value:?}")]
    InvalidBool { key: &'static str, value: String },
    #[error("config key {key} must be an integer, got {value:?}")]
    InvalidInt { key: &'static str, value: String },
    #[error("config key {key} names {name:?}, which is not registered")]
    UnknownComponent { key: &'static str, name: String },
    #[error("config key {key} names {name:?}, which is a {found} and not a {expected}")]
    IncompatibleComponent {
        key: &'static str,
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A backend could not be constructed. The gateway recovers by falling back
/// to the noop sink.
#[derive(Debug, thiserror::Error)]
pub enum BackendUnavailable {
    #[error("could not resolve {host}:{port}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: TransportError,
    },
    #[error("could not bind metrics socket")]
    Bind(#[source] std::io::Error),
    #[error("statsgate was built without the `{0}` feature")]
    FeatureDisabled(&'static str),
    #[error("{0}")]
    Other(#[source] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidName(#[from] InvalidName),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    BackendUnavailable(#[from] BackendUnavailable),
    #[error("failed to emit stat")]
    Transport(#[source] TransportError),
}

impl Error {
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<TransportError>,
    {
        Self::Transport(err.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
