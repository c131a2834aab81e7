use thiserror::Error;

pub type FlitResult<T> = Result<T, FlitError>;

#[derive(Debug, Error)]
pub enum FlitError {
    #[error("truncated input: needed {needed} bytes, had {have}")]
    Truncated { needed: usize, have: usize },

    #[error("unknown frame type {0:#04x}")]
    UnknownFrameType(u8),

    #[error("frame spans {span} bytes but only {remaining} remain in the payload")]
    FrameOvershoot { span: usize, remaining: usize },

    #[error("{what} value {value} is out of range")]
    ValueTooLarge { what: &'static str, value: u64 },

    #[error("stream {0} is not writable in its current state")]
    NotWritable(u64),

    #[error("stream {0} is not readable in its current state")]
    NotReadable(u64),

    #[error("stream {0} was not found")]
    UnknownStream(u64),

    #[error("stream table is full, refusing stream {0}")]
    StreamTableFull(u64),

    #[error("packet size has not been negotiated")]
    SizeNotNegotiated,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// small guard used all over the decoders
pub(crate) fn ensure_len(bytes: &[u8], needed: usize) -> FlitResult<()> {
    if bytes.len() < needed {
        return Err(FlitError::Truncated {
            needed,
            have: bytes.len(),
        });
    }
    Ok(())
}
