use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

/// Error kinds surfaced across the session adapter boundary.
///
/// `EncodingError` from the design notes has no variant here: invalid
/// UTF-8 is repaired inline by [`crate::utf8::Utf8Decoder`] (replacement
/// character substitution) and never reaches the consumer.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The inbound source closed before `read(n)` was satisfied.
    #[error("incomplete read: got {} of {requested} requested characters", partial.chars().count())]
    IncompleteRead { partial: String, requested: usize },

    /// The user sent a break while a read was pending.
    #[error("break received")]
    Break,

    /// Terminal dimensions changed while a read was pending.
    #[error("terminal resized to {width}x{height}")]
    Resized { width: u16, height: u16 },

    /// Operation attempted after the session closed; no I/O occurs.
    #[error("session closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
