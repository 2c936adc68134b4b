use std::fmt;

/// Error codes for all engine and language diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E1xxx: Syntax errors raised by bindings
/// - E2xxx: Name resolution errors
/// - E8xxx: Engine completion checks
/// - E9xxx: Scheduling failures
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ErrorCode {
    // Syntax Errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Expected expression
    E1002,
    /// Unclosed delimiter
    E1003,
    /// Expected identifier
    E1004,
    /// Invalid literal
    E1005,

    // Name Resolution Errors (E2xxx)
    /// Unknown identifier
    E2001,

    // Engine Completion (E8xxx)
    /// Node left unresolved after draining
    E8001,

    // Scheduling Errors (E9xxx)
    /// No runnable work while blocked work remains
    E9001,
    /// Wall-clock budget exceeded
    E9002,
    /// Step budget exceeded
    E9003,
}

impl ErrorCode {
    /// Check if this is a scheduling error.
    pub fn is_scheduling_error(&self) -> bool {
        matches!(self, ErrorCode::E9001 | ErrorCode::E9002 | ErrorCode::E9003)
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E8001 => "E8001",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
            ErrorCode::E9003 => "E9003",
        }
    }

    /// One-line description of what the code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "unexpected token",
            ErrorCode::E1002 => "expected expression",
            ErrorCode::E1003 => "unclosed delimiter",
            ErrorCode::E1004 => "expected identifier",
            ErrorCode::E1005 => "invalid literal",
            ErrorCode::E2001 => "unknown identifier",
            ErrorCode::E8001 => "unresolved node",
            ErrorCode::E9001 => "deadlock",
            ErrorCode::E9002 => "timeout",
            ErrorCode::E9003 => "step limit exceeded",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E1001.to_string(), "E1001");
        assert_eq!(ErrorCode::E9001.as_str(), "E9001");
    }

    #[test]
    fn test_scheduling_codes() {
        assert!(ErrorCode::E9002.is_scheduling_error());
        assert!(!ErrorCode::E8001.is_scheduling_error());
    }
}
