//! Receiver and bound-target resolution.
//!
//! A bound call target fixes the receiver and prepends arguments. Resolving
//! a call walks through any number of binding layers with a loop, so the
//! frame replacer always sees the underlying function, the final receiver
//! and the full argument list before it destroys anything.

use crate::value::{Callable, Closure, NativeFunction, Value};
use std::rc::Rc;

/// The function that actually runs once all binding layers are peeled off
#[derive(Clone)]
pub enum ResolvedTarget {
    Script(Rc<Closure>),
    Native(Rc<NativeFunction>),
}

/// A fully resolved call
#[derive(Clone)]
pub struct ResolvedCall {
    pub target: ResolvedTarget,
    pub receiver: Value,
    pub arguments: Vec<Value>,

    /// Number of bound layers that were unwrapped
    pub layers: usize,
}

impl ResolvedTarget {
    pub fn name(&self) -> &str {
        match self {
            ResolvedTarget::Script(closure) => &closure.name,
            ResolvedTarget::Native(native) => &native.name,
        }
    }
}

impl std::fmt::Debug for ResolvedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCall")
            .field("target", &self.target.name())
            .field("receiver", &self.receiver)
            .field("arguments", &self.arguments)
            .field("layers", &self.layers)
            .finish()
    }
}

/// Resolve `target` called with `receiver` and `arguments`
///
/// Each bound layer discards the receiver supplied so far in favour of its
/// fixed one and prepends its prefix to the arguments collected so far.
pub fn resolve(target: &Callable, receiver: Value, arguments: Vec<Value>) -> ResolvedCall {
    let mut current = target.clone();
    let mut receiver = receiver;
    let mut arguments = arguments;
    let mut layers = 0;

    loop {
        match current {
            Callable::Script(closure) => {
                return finish(ResolvedTarget::Script(closure), receiver, arguments, layers);
            }
            Callable::Native(native) => {
                return finish(ResolvedTarget::Native(native), receiver, arguments, layers);
            }
            Callable::Bound(bound) => {
                let mut combined = Vec::with_capacity(bound.prefix.len() + arguments.len());
                combined.extend(bound.prefix.iter().cloned());
                combined.extend(arguments);
                arguments = combined;
                receiver = bound.receiver.clone();
                current = bound.target.clone();
                layers += 1;
            }
        }
    }
}

fn finish(
    target: ResolvedTarget,
    receiver: Value,
    arguments: Vec<Value>,
    layers: usize,
) -> ResolvedCall {
    if layers > 0 {
        tracing::trace!(
            target: "tailspin::binding",
            function = target.name(),
            layers,
            argc = arguments.len(),
            "unwrapped bound call target"
        );
    }
    ResolvedCall {
        target,
        receiver,
        arguments,
        layers,
    }
}
