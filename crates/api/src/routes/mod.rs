//! Route handlers

pub mod precipitation;
pub mod stations;
pub mod temperature;
