//! Utility functions for the demos
//!
//! Host-side TAP configuration and argument parsing.

pub mod network;
