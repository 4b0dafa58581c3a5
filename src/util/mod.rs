//! Utility modules: bounded polling.

pub mod poll;
