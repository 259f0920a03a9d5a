//! Blank-line block decoder for the streaming chat transfer.
//!
//! The backend frames its stream as text blocks separated by a blank line
//! (`\n\n`). Chunks arrive with arbitrary boundaries: a separator may be
//! split across two chunks, or several complete blocks may arrive in one.
//! The decoder owns the carry-over buffer so reassembly is testable in
//! isolation from the transport.

/// Stateful decoder that reassembles complete blocks from chunked text.
#[derive(Debug, Default)]
pub struct BlockDecoder {
    /// Text carried over between `feed` calls (no complete block yet).
    buffer: String,
}

/// Block separator used by the backend stream.
const SEPARATOR: &str = "\n\n";

impl BlockDecoder {
    /// Create a new decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete block it completes.
    ///
    /// Returns the blocks in stream order. Blank blocks (consecutive
    /// separators) are skipped; they carry no grammar.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut blocks = Vec::new();
        while let Some(pos) = self.buffer.find(SEPARATOR) {
            let block: String = self.buffer.drain(..pos + SEPARATOR.len()).collect();
            let block = &block[..pos];
            if !block.trim().is_empty() {
                blocks.push(block.to_string());
            }
        }
        blocks
    }

    /// Emit the residual block once the transport has ended.
    ///
    /// The server may omit the trailing separator on the last event, so a
    /// non-blank residue is one final block. Whitespace-only residue yields
    /// nothing, and a second flush yields nothing.
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}
