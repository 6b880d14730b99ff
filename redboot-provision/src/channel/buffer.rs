//! Sliding-window pattern buffer, plus ANSI escape stripping.
//!
//! Only the last `search_depth` bytes of console output are retained and
//! searched for prompt patterns. A flash load prints a progress spinner for
//! minutes before the prompt returns, so memory stays O(search_depth)
//! rather than O(output).

use bytes::{Buf, BytesMut};
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Bounded window over the most recent console output.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The last `search_depth` bytes received.
    window: BytesMut,

    /// Maximum bytes retained and searched.
    search_depth: usize,

    /// Searches never look before this offset into `window`.
    floor: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            window: BytesMut::with_capacity(search_depth * 2),
            search_depth,
            floor: 0,
        }
    }

    /// Append console text, dropping whatever falls out of the window.
    pub fn extend(&mut self, data: &[u8]) {
        self.window.extend_from_slice(data);

        if self.window.len() > self.search_depth {
            // O(1) pointer bump
            let excess = self.window.len() - self.search_depth;
            self.window.advance(excess);
            self.floor = self.floor.saturating_sub(excess);
        }
    }

    /// Search the window for the pattern.
    ///
    /// The search starts at the floor set by [`mark`](Self::mark). Returned
    /// offsets are relative to the start of the searched region.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(&self.window[self.floor..])
    }

    /// Check if the window contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Hide everything received so far from later searches.
    ///
    /// Used after answering an interactive question so the question text
    /// cannot satisfy the next wait.
    pub fn mark(&mut self) {
        self.floor = self.window.len();
    }

    /// Take the window contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.floor = 0;
        self.window.split().to_vec()
    }

    /// Get a reference to the window contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.window
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Stateful ANSI escape stripper.
///
/// Escape sequences may be split across reads, so the parser lives as
/// long as the session.
pub struct AnsiStripper {
    parser: Parser,
}

impl AnsiStripper {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Return `data` with escape sequences and non-layout controls removed.
    pub fn strip(&mut self, data: &[u8]) -> Vec<u8> {
        let mut collector = TextCollector {
            out: Vec::with_capacity(data.len()),
        };
        self.parser.advance(&mut collector, data);
        collector.out
    }
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnsiStripper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiStripper").finish_non_exhaustive()
    }
}

struct TextCollector {
    out: Vec<u8>,
}

impl Perform for TextCollector {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out
            .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // Keep layout controls; RedBoot's load spinner relies on CR and BS
        if matches!(byte, b'\n' | b'\r' | b'\t' | 0x08) {
            self.out.push(byte);
        }
    }
}
