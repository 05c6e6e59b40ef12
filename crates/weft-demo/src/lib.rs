#![forbid(unsafe_code)]

//! weft demo library.
//!
//! The binary in `main.rs` wires these together; tests drive [`app::DemoApp`]
//! on a headless backend.

pub mod app;
pub mod cli;
pub mod logging;
