//! Reusable data structures

pub mod gap_buffer;

pub use gap_buffer::GapBuffer;
