//! Oberheim Matrix 1000

pub mod global;
pub mod matrix1000;
pub mod params;

pub use global::{GlobalParameters, Matrix1000Global, MidiSettings, Vibrato};
pub use matrix1000::{Matrix1000, Matrix1000Patch};
pub use params::{FlagGroup, ModSlot, Param};
