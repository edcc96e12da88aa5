//! Output sinks consuming drained pipeline messages

pub mod console;

pub use console::{ColorTable, ConsoleSink, ConsoleSinkBuilder};
