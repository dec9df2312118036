//! Part tracking state machine.
//!
//! Decides which part may be released for deletion. The tracked part starts at
//! 1 and only moves forward; a part is released when the tool is seen reading a
//! later part, or, for the last tracked part, when the run succeeds. Every part
//! is released at most once.

use std::collections::BTreeSet;

/// The tool moved from one part to a later one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Part the tool has finished with
    pub from: u32,
    /// Part the tool is now reading
    pub to: u32,
}

/// Tracks the part currently being consumed
#[derive(Debug, Clone)]
pub struct PartTracker {
    current: u32,
    released: BTreeSet<u32>,
}

impl Default for PartTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PartTracker {
    /// Start tracking at part 1
    pub fn new() -> Self {
        Self {
            current: 1,
            released: BTreeSet::new(),
        }
    }

    /// Part the tool is currently reading
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Feed a part number seen in the tool's output.
    ///
    /// Returns the transition when `part` is strictly greater than the current
    /// part; the vacated part is released. Repeats and backward references are
    /// ignored.
    pub fn observe(&mut self, part: u32) -> Option<Transition> {
        if part <= self.current {
            return None;
        }

        let from = self.current;
        self.current = part;
        self.released.insert(from);
        Some(Transition { from, to: part })
    }

    /// Release the current part after a successful run.
    ///
    /// Returns `None` if it was already released.
    pub fn release_current(&mut self) -> Option<u32> {
        self.released.insert(self.current).then_some(self.current)
    }

    /// Whether `part` has been released
    pub fn is_released(&self, part: u32) -> bool {
        self.released.contains(&part)
    }
}
