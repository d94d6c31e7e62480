//! Runtime configuration.

/// Maximum call stack depth to prevent unbounded non-tail recursion
pub const MAX_CALL_STACK_DEPTH: usize = 1000;

/// Environment variable overriding [`InterpreterConfig::max_call_depth`]
pub const MAX_DEPTH_ENV: &str = "TAILSPIN_MAX_DEPTH";

/// Environment variable toggling [`InterpreterConfig::tail_call_elimination`]
pub const TAIL_CALLS_ENV: &str = "TAILSPIN_TAIL_CALLS";

/// Settings for an [`crate::Interpreter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Maximum number of live activation records
    pub max_call_depth: usize,

    /// When false, marked tail calls run as ordinary calls and every frame
    /// stays visible (the mode used while a debugger is attached)
    pub tail_call_elimination: bool,
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self {
            max_call_depth: MAX_CALL_STACK_DEPTH,
            tail_call_elimination: true,
        }
    }

    /// Create a configuration with a custom maximum depth
    pub fn with_max_depth(max_call_depth: usize) -> Self {
        Self {
            max_call_depth,
            ..Self::new()
        }
    }

    pub fn tail_call_elimination(mut self, enabled: bool) -> Self {
        self.tail_call_elimination = enabled;
        self
    }

    pub fn max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Read overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; absent or unparsable values keep
    /// their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();

        if let Some(raw) = lookup(MAX_DEPTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_call_depth = depth,
                _ => tracing::warn!(
                    target: "tailspin::config",
                    value = %raw,
                    "ignoring invalid {MAX_DEPTH_ENV}"
                ),
            }
        }

        if let Some(raw) = lookup(TAIL_CALLS_ENV) {
            match parse_toggle(&raw) {
                Some(enabled) => config.tail_call_elimination = enabled,
                None => tracing::warn!(
                    target: "tailspin::config",
                    value = %raw,
                    "ignoring invalid {TAIL_CALLS_ENV}"
                ),
            }
        }

        config
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_toggle(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
