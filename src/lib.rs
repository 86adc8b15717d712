//! Sysex codecs for a handful of vintage synthesizers and drum machines.
//!
//! Each device family gets a [`Codec`] that recognizes its dumps, parses them
//! into a typed patch and emits a patch back as an ordered [`Emission`] of
//! sysex messages, channel messages and pauses. The [`Registry`] picks the
//! right codec for an incoming message.
//!
//! ```no_run
//! use synthsyx::{read_sysex_file, CodecConfig, Registry};
//!
//! let registry = Registry::new(CodecConfig::default());
//! for message in read_sysex_file("bank.syx")? {
//!     if let Some(patch) = registry.parse(&message).ok() {
//!         println!("{}: {}", patch.family(), patch.name());
//!     }
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

#![warn(missing_docs)]

pub mod alesis;
pub mod casio;
pub mod codec;
pub mod error;
pub mod korg;
pub mod name;
pub mod oberheim;
pub mod registry;
pub mod sysex;
pub mod yamaha;

pub use codec::{
    Channel, Codec, CodecConfig, Emission, Packet, ParseOutcome, Patch, PatchLocation, Target,
};
pub use error::CodecError;
pub use registry::{AnyPatch, DynCodec, Family, Registry};
pub use sysex::{read_sysex_file, split_messages};
