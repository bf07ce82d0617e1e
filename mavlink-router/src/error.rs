use thiserror::Error;

/// Errors raised while bringing the router up: all of them prevent the router from
/// starting and should abort initialization.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("no dialect configured for this router")]
    NoDialectSet,

    #[error("invalid connection string {0:?}: unknown protocol")]
    InvalidProtocol(String),

    #[error("invalid connection string {0:?}: invalid IP address {1:?}")]
    InvalidIpAddress(String, String),

    #[error("invalid connection string {0:?}: invalid port {1:?}")]
    InvalidPort(String, String),

    #[error("invalid connection string {0:?}: invalid baud rate {1:?}")]
    InvalidBaud(String, String),

    #[error("serial device {0:?} is not attached")]
    PortNotAttached(String),

    #[error("failed to bind/connect {address:?}: {source}")]
    Io {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised when a local consumer asks the router to send a message it does not
/// recognize. Frame-level transport errors never reach this type: they are confined to
/// the adapter that produced them (see [`crate::wire::FrameError`]).
#[derive(Error, Debug)]
pub enum SendError {
    #[error("message is not a known message for the configured dialect")]
    ProtocolUndefined,
}
