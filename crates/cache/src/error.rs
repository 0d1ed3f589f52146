use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    AllocationFailed,
}

impl fmt::Display for CacheError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::AllocationFailed => write!(formatter, "cache tile allocation failed"),
        }
    }
}

impl std::error::Error for CacheError {}
