//! Argument-count reconciliation.
//!
//! A mismatch between supplied and declared argument counts is never an
//! error: missing trailing parameters read as `undefined` and surplus
//! arguments stay reachable through `arguments`. The adaptation depends on
//! the current call only, so a callee entered through frame replacement
//! sees exactly what a direct call would have given it.

use crate::value::Value;

/// How the supplied argument count relates to the declared one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityMismatch {
    Exact,
    /// This many arguments beyond the declared parameters
    Surplus(usize),
    /// This many trailing parameters padded with `undefined`
    Missing(usize),
}

/// Parameter bindings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedArguments {
    /// Exactly one value per declared parameter
    pub parameters: Vec<Value>,

    /// Every supplied argument, for the callee's `arguments` collection
    pub arguments: Vec<Value>,

    pub mismatch: ArityMismatch,
}

impl ArityMismatch {
    pub fn between(declared: usize, supplied: usize) -> Self {
        if supplied > declared {
            ArityMismatch::Surplus(supplied - declared)
        } else if supplied < declared {
            ArityMismatch::Missing(declared - supplied)
        } else {
            ArityMismatch::Exact
        }
    }
}

/// Reconcile `supplied` against a callee declaring `declared` parameters
pub fn adapt(declared: usize, supplied: Vec<Value>) -> AdaptedArguments {
    let mismatch = ArityMismatch::between(declared, supplied.len());
    let mut parameters: Vec<Value> = supplied.iter().take(declared).cloned().collect();
    parameters.resize(declared, Value::Undefined);

    AdaptedArguments {
        parameters,
        arguments: supplied,
        mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(values: &[i32]) -> Vec<Value> {
        values.iter().map(|n| Value::from(*n)).collect()
    }

    #[test]
    fn test_exact_arity() {
        let adapted = adapt(2, numbers(&[1, 2]));
        assert_eq!(adapted.parameters, numbers(&[1, 2]));
        assert_eq!(adapted.arguments, numbers(&[1, 2]));
        assert_eq!(adapted.mismatch, ArityMismatch::Exact);
    }

    #[test]
    fn test_surplus_arguments_remain_available() {
        let adapted = adapt(1, numbers(&[2, 3, 4]));
        assert_eq!(adapted.parameters, numbers(&[2]));
        assert_eq!(adapted.arguments, numbers(&[2, 3, 4]));
        assert_eq!(adapted.mismatch, ArityMismatch::Surplus(2));
    }

    #[test]
    fn test_missing_parameters_are_undefined() {
        let adapted = adapt(3, numbers(&[2]));
        assert_eq!(
            adapted.parameters,
            vec![Value::from(2), Value::Undefined, Value::Undefined]
        );
        assert_eq!(adapted.arguments, numbers(&[2]));
        assert_eq!(adapted.mismatch, ArityMismatch::Missing(2));
    }

    #[test]
    fn test_no_arguments_no_parameters() {
        let adapted = adapt(0, vec![]);
        assert!(adapted.parameters.is_empty());
        assert_eq!(adapted.mismatch, ArityMismatch::Exact);
    }
}
