//! Stack-trace snapshots of the live call chain.
//!
//! A trace is produced lazily by following reporting-predecessor links from
//! the innermost record outwards. Since frame replacement re-parents the
//! callee onto the replaced caller's predecessor, a chain of tail calls
//! shows up as a single entry for its final callee.

use crate::call_stack::{CallStack, RecordId};
use std::iter::FusedIterator;

/// A single entry in a stack trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackTraceEntry {
    /// Depth in the call stack (0 = bottom, higher = deeper)
    pub depth: usize,

    /// Name of the function
    pub function_name: String,

    /// Number of tail calls that collapsed into this entry
    pub tail_call_count: usize,
}

/// Lazy, restartable walk over the live records, innermost first
///
/// Cloning the iterator restarts from the clone point; a fresh walk is
/// available through [`CallStack::stack_trace`] at any time.
#[derive(Debug, Clone)]
pub struct StackTrace<'a> {
    stack: &'a CallStack,
    start: Option<RecordId>,
    start_remaining: usize,
    cursor: Option<RecordId>,
    remaining: usize,
}

impl<'a> StackTrace<'a> {
    pub(crate) fn new(stack: &'a CallStack, top: Option<RecordId>, depth: usize) -> Self {
        Self {
            stack,
            start: top,
            start_remaining: depth,
            cursor: top,
            remaining: depth,
        }
    }

    /// Rewind to the innermost record of the snapshot
    pub fn restart(&mut self) {
        self.cursor = self.start;
        self.remaining = self.start_remaining;
    }

    /// Function names, innermost first
    pub fn labels(self) -> Vec<String> {
        self.map(|entry| entry.function_name).collect()
    }
}

impl Iterator for StackTrace<'_> {
    type Item = StackTraceEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let record = self.stack.slot(id)?;
        self.cursor = record.predecessor;
        self.remaining = self.remaining.saturating_sub(1);

        Some(StackTraceEntry {
            depth: self.remaining,
            function_name: record.function_name().to_string(),
            tail_call_count: record.tail_call_count,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.cursor {
            Some(_) => (0, Some(self.remaining)),
            None => (0, Some(0)),
        }
    }
}

impl FusedIterator for StackTrace<'_> {}
