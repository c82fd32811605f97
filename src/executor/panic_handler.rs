use super::task::{TaskError, TaskResult};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs a work action, folding a panic into [`TaskError::Panicked`].
///
/// Neither a returned error nor an unwinding panic escapes this call, so a
/// misbehaving action can never take its worker thread down with it.
pub fn guard<F, T>(f: F) -> TaskResult<T>
where
    F: FnOnce() -> TaskResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(TaskError::Panicked(PanicInfo::from_payload(payload))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicInfo {
    pub message: String,
}

impl PanicInfo {
    pub(crate) fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        Self { message }
    }
}

impl fmt::Display for PanicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_success() {
        let result = guard(|| Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_guard_passes_errors_through() {
        let result: TaskResult<()> = guard(|| Err(TaskError::failed("disk full")));
        match result {
            Err(TaskError::Failed(cause)) => assert_eq!(cause.to_string(), "disk full"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_guard_catches_str_panic() {
        let result: TaskResult<()> = guard(|| panic!("boom"));
        match result {
            Err(TaskError::Panicked(info)) => assert_eq!(info.message, "boom"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_guard_catches_formatted_panic() {
        let id = 7;
        let result: TaskResult<()> = guard(|| panic!("task {} exploded", id));
        match result {
            Err(TaskError::Panicked(info)) => assert_eq!(info.to_string(), "task 7 exploded"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
