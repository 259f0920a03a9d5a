//! Streaming wire layer for the structured chat endpoint.
//!
//! The backend answers `POST /api/chat/structured/stream` with a continuous
//! text transfer: blocks separated by a blank line, each with an optional
//! `event:` line and one or more `data:` lines carrying JSON.
//!
//! # Module structure
//! - `decoder` - chunk reassembly into complete blocks (`BlockDecoder`)
//! - `parser` - block interpretation into `(kind, payload)` pairs
//! - `events` - typed `StreamEvent` mapping

mod decoder;
mod events;
mod parser;

pub use decoder::BlockDecoder;
pub use events::StreamEvent;
pub use parser::{interpret_block, WireEvent, DEFAULT_KIND};
