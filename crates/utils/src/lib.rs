//! Shared utilities for gatehouse

pub mod tracing;
