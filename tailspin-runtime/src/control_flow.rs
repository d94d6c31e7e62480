//! Abrupt completions and the `try`/`finally` guard.
//!
//! Evaluation reports anything other than "carry on" as an [`Abrupt`]
//! completion. A marked tail call is one of them: it travels outwards like a
//! `return` until it reaches the function executor, which performs the frame
//! replacement. On the way out it may cross `try` statements. Each one runs
//! its [`PendingCleanup`] state machine, so a pending `finally` always runs
//! before the frame is replaced and may override the tail call.

use crate::call_stack::CallStackError;
use crate::error::RuntimeError;
use crate::value::{Callable, Value};

/// A tail call that has been requested but not yet performed
#[derive(Clone)]
pub struct TailCallRequest {
    pub target: Callable,
    pub receiver: Value,
    pub arguments: Vec<Value>,
}

impl std::fmt::Debug for TailCallRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailCallRequest")
            .field("target", &self.target.name())
            .field("receiver", &self.receiver)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Non-normal completion of a statement or expression
#[derive(Debug)]
pub enum Abrupt {
    Return(Value),
    Throw(Value),
    TailCall(TailCallRequest),
    /// Not a language-level exception: bypasses `catch` and `finally`
    Fault(RuntimeError),
}

impl From<RuntimeError> for Abrupt {
    fn from(error: RuntimeError) -> Self {
        Abrupt::Fault(error)
    }
}

impl From<CallStackError> for Abrupt {
    fn from(error: CallStackError) -> Self {
        Abrupt::Fault(error.into())
    }
}

/// Outcome of running a statement list
pub type Completion = Result<Value, Abrupt>;

/// What a `try` statement will do once its cleanup has run
#[derive(Debug)]
pub enum Disposition {
    /// Completed normally with this value
    Normal(Value),
    PendingReturn(Value),
    PendingThrow(Value),
    PendingTailCall(TailCallRequest),
}

/// Coarse state of a [`PendingCleanup`], for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Normal,
    PendingReturn,
    PendingThrow,
    PendingTailCall,
}

/// Disposition bookkeeping for one `try` statement
///
/// Every new outcome overwrites the pending one (last write wins): a `catch`
/// that completes replaces the exception it handled, and a `finally` that
/// transfers control replaces whatever was pending.
#[derive(Debug)]
pub struct PendingCleanup {
    disposition: Disposition,
}

impl PendingCleanup {
    /// Start guarding with the outcome of the `try` block
    ///
    /// Faults are returned straight back: they skip `catch` and `finally`.
    pub fn new(outcome: Completion) -> Result<Self, Abrupt> {
        let mut cleanup = Self {
            disposition: Disposition::Normal(Value::Undefined),
        };
        cleanup.record(outcome)?;
        Ok(cleanup)
    }

    /// Overwrite the pending disposition with a newer outcome
    pub fn record(&mut self, outcome: Completion) -> Result<(), Abrupt> {
        let next = match outcome {
            Ok(value) => Disposition::Normal(value),
            Err(Abrupt::Return(value)) => Disposition::PendingReturn(value),
            Err(Abrupt::Throw(value)) => Disposition::PendingThrow(value),
            Err(Abrupt::TailCall(request)) => Disposition::PendingTailCall(request),
            Err(fault @ Abrupt::Fault(_)) => return Err(fault),
        };

        if !matches!(self.disposition, Disposition::Normal(_)) {
            tracing::debug!(
                target: "tailspin::guard",
                from = ?self.state(),
                to = ?state_of(&next),
                "pending disposition overridden"
            );
        }
        self.disposition = next;
        Ok(())
    }

    pub fn state(&self) -> GuardState {
        state_of(&self.disposition)
    }

    /// Take the exception this guard is holding, if any, so a `catch`
    /// clause can handle it
    pub fn take_exception(&mut self) -> Option<Value> {
        match std::mem::replace(&mut self.disposition, Disposition::Normal(Value::Undefined)) {
            Disposition::PendingThrow(exception) => Some(exception),
            other => {
                self.disposition = other;
                None
            }
        }
    }

    /// Note that the cleanup block is about to run
    pub fn enter_cleanup(&self) {
        if let Disposition::PendingTailCall(request) = &self.disposition {
            tracing::debug!(
                target: "tailspin::guard",
                callee = %request.target.name(),
                "tail call deferred until finally completes"
            );
        }
    }

    /// Finish the `try` statement given the cleanup's own outcome
    ///
    /// A cleanup that completes normally leaves the pending disposition in
    /// force; any other outcome replaces it.
    pub fn complete(mut self, cleanup: Completion) -> Completion {
        if cleanup.is_err() {
            self.record(cleanup)?;
        }
        self.resume()
    }

    /// Re-raise the pending disposition
    pub fn resume(self) -> Completion {
        match self.disposition {
            Disposition::Normal(value) => Ok(value),
            Disposition::PendingReturn(value) => Err(Abrupt::Return(value)),
            Disposition::PendingThrow(value) => Err(Abrupt::Throw(value)),
            Disposition::PendingTailCall(request) => {
                tracing::trace!(
                    target: "tailspin::guard",
                    callee = %request.target.name(),
                    "resuming tail call"
                );
                Err(Abrupt::TailCall(request))
            }
        }
    }
}

fn state_of(disposition: &Disposition) -> GuardState {
    match disposition {
        Disposition::Normal(_) => GuardState::Normal,
        Disposition::PendingReturn(_) => GuardState::PendingReturn,
        Disposition::PendingThrow(_) => GuardState::PendingThrow,
        Disposition::PendingTailCall(_) => GuardState::PendingTailCall,
    }
}
