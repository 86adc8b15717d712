//! Korg MicroKorg

pub mod microkorg;
pub mod packing;
pub mod vocoder;

pub use microkorg::{is_write_error, MicroKorg, MicroKorgProgram, VoiceMode};
pub use packing::{pack_7bit, unpack_8bit};
pub use vocoder::{MicroKorgVocoder, VocoderChannel, VocoderProgram};
