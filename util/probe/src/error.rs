use thiserror::Error;

/// Failure of a single motion command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error("Command timed out: ({0} seconds)")]
    Timeout(f64),
    #[error("MDI command failed with code {0}")]
    Failed(i32),
    #[error("{0}")]
    Runtime(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    /// Parameters rejected before any motion was attempted.
    #[error("{0}")]
    Validation(String),
    #[error("{routine}: {source}")]
    Motion {
        routine: &'static str,
        source: MotionError,
    },
}
impl ProbeError {
    pub fn validation(message: impl Into<String>) -> Self {
        ProbeError::Validation(message.into())
    }
}

pub trait InRoutine<T> {
    fn in_routine(self, routine: &'static str) -> Result<T, ProbeError>;
}
impl<T> InRoutine<T> for Result<T, MotionError> {
    fn in_routine(self, routine: &'static str) -> Result<T, ProbeError> {
        self.map_err(|source| ProbeError::Motion { routine, source })
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_messages() {
        assert_eq!(MotionError::Timeout(30.0).to_string(), "Command timed out: (30 seconds)");
        assert_eq!(MotionError::Timeout(2.5).to_string(), "Command timed out: (2.5 seconds)");
        let error: Result<(), _> = Err(MotionError::Failed(3));
        assert_eq!(
            error.in_routine("probe_xp").unwrap_err().to_string(),
            "probe_xp: MDI command failed with code 3"
        );
        assert_eq!(
            ProbeError::validation("X length hint must be larger than 0").to_string(),
            "X length hint must be larger than 0"
        );
    }
}
