//! Operator commands for the gatehouse request gate

pub mod commands;

pub use commands::Commands;
