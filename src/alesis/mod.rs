//! Alesis drum modules

pub mod d4;
pub mod nrpn;

pub use d4::{compose_voice, decompose_voice, AlesisD4, DeviceVariant, Drum, DrumKit};
pub use nrpn::{nrpn_edit, DrumParam, KitParam};
