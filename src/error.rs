use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("No frame received within {budget} polls")]
    NoReply { budget: u32 },

    #[error("No matching reply within {budget} polls")]
    Timeout { budget: u32 },

    #[error("Frame buffer does not hold a {expected} record")]
    ProtocolMismatch { expected: &'static str },

    #[error("Record of {len} bytes exceeds its bound of {limit}")]
    SizeMismatch { len: usize, limit: usize },

    #[error("Payload of {len} bytes does not fit the {capacity} bytes available")]
    PayloadTooLarge { len: usize, capacity: usize },

    #[error("Invalid DNS name")]
    InvalidName,

    #[error("Device error: {0}")]
    Device(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;
