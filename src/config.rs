//! Runtime configuration shared by both execution engines.

/// Environment variable that switches on execution tracing.
pub const TRACE_ENV_VAR: &str = "MONKEY_TRACE";

/// Options controlling how programs are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeConfig {
    /// Print every evaluated node (evaluator) or executed instruction (VM)
    /// to stderr.
    pub trace: bool,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        let trace = std::env::var(TRACE_ENV_VAR)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self { trace }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_quiet() {
        assert!(!RuntimeConfig::default().trace);
        assert!(RuntimeConfig::new().with_trace(true).trace);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("nope"));
    }
}
