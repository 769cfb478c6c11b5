use helm_validate::ValidatorError;

use crate::governor::GovernorError;
use crate::target::TargetError;

/// Failure of a single instruction. Recorded in the tick result; the tick
/// goes on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstructionError {
    #[error(transparent)]
    Governor(#[from] GovernorError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("LED value {0} does not fit in a byte")]
    LedOperand(i32),

    #[error("Atomic composite aborted at sub-instruction {index}: {error}")]
    AtomicAborted {
        index: usize,
        error: Box<InstructionError>,
    },

    #[error("Composite failed in {} of {total} sub-instructions: {}", .failures.len(), .failures.join("; "))]
    CompositeFailed { total: usize, failures: Vec<String> },
}

impl InstructionError {
    /// The broken-target error buried in this failure, if any.
    pub fn fatal(&self) -> Option<&TargetError> {
        match self {
            InstructionError::Target(e) if e.is_fatal() => Some(e),
            InstructionError::AtomicAborted { error, .. } => error.fatal(),
            _ => None,
        }
    }
}

/// Failure of a whole tick. Only raised when the tick cannot produce a
/// result at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpreterError {
    #[error("Frame validator failed: {0}")]
    Validator(#[from] ValidatorError),

    #[error("Execution target broken at instruction {index}: {error}")]
    TargetBroken { index: usize, error: TargetError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_found_through_atomic_abort() {
        let err = InstructionError::AtomicAborted {
            index: 2,
            error: Box::new(TargetError::Broken("usb unplugged".into()).into()),
        };
        assert_eq!(err.fatal(), Some(&TargetError::Broken("usb unplugged".into())));
    }

    #[test]
    fn test_composite_failure_message_lists_subs() {
        let err = InstructionError::CompositeFailed {
            total: 3,
            failures: vec!["Sub-instruction 1: Target timed out after 20ms".into()],
        };
        assert_eq!(
            err.to_string(),
            "Composite failed in 1 of 3 sub-instructions: Sub-instruction 1: Target timed out after 20ms"
        );
    }
}
