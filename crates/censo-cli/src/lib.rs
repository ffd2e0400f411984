//! CLI library components for the census validator.

pub mod load;
pub mod logging;
