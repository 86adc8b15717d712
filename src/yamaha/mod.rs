//! Yamaha DX7

pub mod dx7;

pub use dx7::{Dx7, Dx7Bank, Dx7Bulk, Dx7Voice};
