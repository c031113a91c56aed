//! EstateFX Common Types
//!
//! This crate contains the types shared across the EstateFX workspace:
//! the supported display currencies and the timing constants used by the
//! rate refresh machinery.

pub mod currency;
pub mod time;

pub use currency::*;
pub use time::*;
