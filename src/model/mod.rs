//! Data types owned by billdrop: sender addresses and scanned bills.

pub mod address;
pub mod bill;
