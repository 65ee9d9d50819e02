//! Small shared helpers.

pub mod fsio;
pub mod logging;
