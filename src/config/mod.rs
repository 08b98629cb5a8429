//! JSON configuration files read by the demo binaries.

pub mod blob_demo;
