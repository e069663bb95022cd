//! Record reassembly for the newline-delimited frame stream.
//!
//! The transport yields arbitrary text fragments with no alignment to record
//! boundaries. [`FrameReassembler`] accumulates fragments and hands back one
//! complete textual record at a time. A record is complete only when a full
//! line, after trimming whitespace, is an outer-level JSON object (`{...}`);
//! the companion server emits exactly one frame per line, so records never
//! contain embedded newlines.

/// Stateful buffer that turns raw text fragments into complete records.
///
/// The pending buffer is an ordered list of lines; the last element is always
/// the (possibly empty) partial line currently being accumulated.
#[derive(Debug)]
pub struct FrameReassembler {
    pending: Vec<String>,
}

impl FrameReassembler {
    /// Create an empty reassembler with an open, empty partial line.
    pub fn new() -> Self {
        Self {
            pending: vec![String::new()],
        }
    }

    /// Append a text fragment, splitting on newline boundaries.
    ///
    /// The portion before the first newline merges onto the open partial
    /// line; subsequent newline-delimited pieces become new pending lines;
    /// the final piece becomes the new open partial line.
    pub fn add(&mut self, chunk: &str) {
        let mut pieces = chunk.split('\n');

        if let (Some(first), Some(open)) = (pieces.next(), self.pending.last_mut()) {
            open.push_str(first);
        }

        for piece in pieces {
            self.pending.push(piece.to_string());
        }
    }

    /// Remove and return the oldest pending record, if one is complete.
    ///
    /// Inspects the oldest closed line (the open partial is never a
    /// candidate): if it trims to `{...}` it is removed and returned;
    /// otherwise `None` is returned and the buffer is left untouched. One
    /// `add` may complete several records, so callers loop until `None`.
    pub fn take(&mut self) -> Option<String> {
        // pending always ends with the open partial line; anything before it
        // is a closed line.
        if self.pending.len() < 2 {
            return None;
        }

        let line = self.pending[0].trim();
        if line.starts_with('{') && line.ends_with('}') {
            let record = line.to_string();
            self.pending.remove(0);
            return Some(record);
        }

        None
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}
