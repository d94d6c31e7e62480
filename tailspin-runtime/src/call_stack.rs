//! Activation record management and frame replacement
//!
//! This module owns every live activation record. Records live in a slot
//! table and refer to their reporting predecessor by [`RecordId`], never by
//! pointer, so destroying a record is just releasing its slot.
//!
//! ## Frame replacement
//!
//! A tail call from record `C` captures `C`'s reporting predecessor `P`,
//! releases `C`'s slot and installs the callee's record with `P` as its
//! predecessor. Released slots are reused first, so an unbounded chain of
//! tail calls keeps using the same slot and the depth never grows. Records
//! eliminated this way never appear in a later stack trace.

use crate::stack_trace::StackTrace;
use crate::value::{Closure, Value};
use std::rc::Rc;
use thiserror::Error;

/// Errors that can occur during call stack operations
#[derive(Debug, Error)]
pub enum CallStackError {
    #[error("Stack overflow: maximum call depth of {max_depth} exceeded")]
    StackOverflow { max_depth: usize },

    #[error("Stack underflow: attempted to pop from empty stack")]
    StackUnderflow,

    #[error("Activation record {id} is not live")]
    RecordNotFound { id: RecordId },

    #[error("Tail call replacement failed: {message}")]
    TailCallReplacementFailed { message: String },
}

/// Handle to a slot in the record table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One logical invocation of a script function
#[derive(Debug, Clone)]
pub struct ActivationRecord {
    /// The function running in this record
    pub function: Rc<Closure>,

    /// Receiver (`this`) for this invocation
    pub receiver: Value,

    /// Every supplied argument, in order
    pub arguments: Vec<Value>,

    /// The record reported as caller; never a replaced record
    pub predecessor: Option<RecordId>,

    /// Whether this record was installed by frame replacement
    pub is_tail_position: bool,

    /// Number of tail-calling records that collapsed into this position
    pub tail_call_count: usize,
}

impl ActivationRecord {
    /// Create a record for an ordinary (frame-growing) call
    pub fn new(function: Rc<Closure>, receiver: Value, arguments: Vec<Value>) -> Self {
        Self {
            function,
            receiver,
            arguments,
            predecessor: None,
            is_tail_position: false,
            tail_call_count: 0,
        }
    }

    /// Get the function name for display purposes
    pub fn function_name(&self) -> &str {
        &self.function.name
    }
}

/// Call stack manager: the record table plus the innermost live record
#[derive(Debug, Clone)]
pub struct CallStack {
    slots: Vec<Option<ActivationRecord>>,

    /// Released slot indices, reused before the table grows
    free: Vec<usize>,

    /// Innermost live record
    top: Option<RecordId>,

    /// Number of live records
    depth: usize,

    /// Maximum allowed stack depth
    max_depth: usize,

    /// Frame replacements performed since creation
    replacements: usize,
}

impl CallStack {
    /// Create a new empty call stack
    pub fn new() -> Self {
        Self::with_max_depth(crate::config::MAX_CALL_STACK_DEPTH)
    }

    /// Create a new call stack with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            top: None,
            depth: 0,
            max_depth,
            replacements: 0,
        }
    }

    /// Push a record for an ordinary call; its predecessor is the current top
    pub fn push_record(&mut self, mut record: ActivationRecord) -> Result<RecordId, CallStackError> {
        if self.depth >= self.max_depth {
            return Err(CallStackError::StackOverflow {
                max_depth: self.max_depth,
            });
        }

        record.predecessor = self.top;
        let id = self.allocate(record);
        self.top = Some(id);
        self.depth += 1;

        tracing::trace!(
            target: "tailspin::frames",
            record = %id,
            depth = self.depth,
            function = self.slot(id).map(|r| r.function_name()).unwrap_or_default(),
            "pushed activation record"
        );
        Ok(id)
    }

    /// Pop `id`, which must be the innermost record
    pub fn pop_record(&mut self, id: RecordId) -> Result<ActivationRecord, CallStackError> {
        if self.top.is_none() {
            return Err(CallStackError::StackUnderflow);
        }
        if self.top != Some(id) {
            return Err(CallStackError::RecordNotFound { id });
        }

        let record = self.release(id)?;
        self.top = record.predecessor;
        self.depth -= 1;

        tracing::trace!(
            target: "tailspin::frames",
            record = %id,
            depth = self.depth,
            function = record.function_name(),
            "popped activation record"
        );
        Ok(record)
    }

    /// Replace the innermost record `caller` with `callee`
    ///
    /// The caller's record is destroyed before the callee's is installed;
    /// the callee inherits the caller's reporting predecessor. Replacement
    /// never counts against the depth limit.
    pub fn replace_record(
        &mut self,
        caller: RecordId,
        mut callee: ActivationRecord,
    ) -> Result<RecordId, CallStackError> {
        if self.top != Some(caller) {
            return Err(CallStackError::TailCallReplacementFailed {
                message: format!("record {caller} is not the innermost record"),
            });
        }

        let replaced = self.release(caller)?;
        callee.predecessor = replaced.predecessor;
        callee.is_tail_position = true;
        callee.tail_call_count = replaced.tail_call_count + 1;
        drop(replaced);

        let id = self.allocate(callee);
        self.top = Some(id);
        self.replacements += 1;

        tracing::trace!(
            target: "tailspin::frames",
            caller = %caller,
            callee = %id,
            predecessor = ?self.slot(id).and_then(|r| r.predecessor),
            depth = self.depth,
            "replaced activation record"
        );
        Ok(id)
    }

    /// Get the innermost live record
    pub fn current_record(&self) -> Option<&ActivationRecord> {
        self.top.and_then(|id| self.slot(id))
    }

    pub fn current_id(&self) -> Option<RecordId> {
        self.top
    }

    /// Get a live record by id
    pub fn record(&self, id: RecordId) -> Result<&ActivationRecord, CallStackError> {
        self.slot(id).ok_or(CallStackError::RecordNotFound { id })
    }

    /// Get the call stack depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of slots ever allocated; bounded by the deepest non-tail nesting
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get total number of frame replacements performed
    pub fn total_tail_calls(&self) -> usize {
        self.replacements
    }

    /// Walk the live chain from the innermost record outwards
    pub fn stack_trace(&self) -> StackTrace<'_> {
        StackTrace::new(self, self.top, self.depth)
    }

    /// Get a formatted stack trace string
    pub fn format_stack_trace(&self, title: &str) -> String {
        let mut result = format!("{title}\n");

        if self.is_empty() {
            result.push_str("  (no call stack)\n");
            return result;
        }

        if self.replacements > 0 {
            result.push_str(&format!(
                "  (proper tail calls: {} frames replaced)\n",
                self.replacements
            ));
        }

        for entry in self.stack_trace() {
            let tail_info = if entry.tail_call_count > 0 {
                format!(" [+{} tail calls]", entry.tail_call_count)
            } else {
                String::new()
            };

            result.push_str(&format!(
                "  {}: {}{}\n",
                entry.depth, entry.function_name, tail_info
            ));
        }

        result
    }

    /// Drop every record (after an aborted run)
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.top = None;
        self.depth = 0;
    }

    pub(crate) fn slot(&self, id: RecordId) -> Option<&ActivationRecord> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn allocate(&mut self, record: ActivationRecord) -> RecordId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(record);
                RecordId(index)
            }
            None => {
                self.slots.push(Some(record));
                RecordId(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: RecordId) -> Result<ActivationRecord, CallStackError> {
        let record = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(CallStackError::RecordNotFound { id })?;
        self.free.push(id.0);
        Ok(record)
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}
