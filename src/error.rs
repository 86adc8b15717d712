//! Codec errors

use thiserror::Error;

/// Everything that can go wrong while framing, parsing or emitting a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// No sysex data at all
    #[error("empty sysex data")]
    Empty,

    /// An `F0` was found without a closing `F7`
    #[error("unterminated sysex message starting at offset {0}")]
    Unterminated(usize),

    /// The message length matches none of the known layouts
    #[error("unexpected message length {actual} for {device}")]
    BadLength {
        /// Device family that rejected the message
        device: &'static str,
        /// Length of the offending message
        actual: usize,
    },

    /// Manufacturer, model or opcode bytes do not match
    #[error("invalid {device} header")]
    BadHeader {
        /// Device family that rejected the message
        device: &'static str,
    },

    /// Ran off the end of the payload while decoding
    #[error("payload truncated at offset {0}")]
    Truncated(usize),

    /// A stored patch number outside of what the device can address
    #[error("patch location bank {bank} number {number} is out of range")]
    InvalidLocation {
        /// Bank index
        bank: u8,
        /// Patch number within the bank
        number: u8,
    },

    /// A drum voice index that no bank of the device holds
    #[error("voice {voice} does not resolve to a {variant} bank")]
    UnresolvableVoice {
        /// Flat voice index
        voice: u16,
        /// Device variant whose bank table was consulted
        variant: &'static str,
    },

    /// MIDI channels run 0..=15 on the wire
    #[error("invalid MIDI channel {0}")]
    InvalidChannel(u8),

    /// The parameter has no remote edit message on this device
    #[error("{0} cannot be sent as a single parameter change")]
    NotEditable(&'static str),

    /// The device only accepts this patch into its edit buffer
    #[error("{0} cannot store a single patch over sysex")]
    CannotStore(&'static str),

    /// A patch was handed to a codec of another device family
    #[error("patch does not belong to {0}")]
    WrongFamily(&'static str),
}
