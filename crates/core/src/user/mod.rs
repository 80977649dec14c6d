//! Local user accounts

pub mod ports;
