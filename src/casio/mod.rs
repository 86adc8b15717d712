//! Casio CZ series

pub mod cz;
pub mod tables;
pub mod transform;

pub use cz::{CasioCz, CzModel, CzTone, Envelope, Line};
