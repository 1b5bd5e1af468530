//! Three-state outcome reported by the cache store.

/// Outcome of a store operation as seen by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    /// Work has started; a `Success` or `Error` follows.
    Loading,
    Success(T),
    /// Display-ready failure message.
    Error(String),
}

impl<T> Resource<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Resource::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Resource::Error(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Resource<U> {
        match self {
            Resource::Loading => Resource::Loading,
            Resource::Success(data) => Resource::Success(f(data)),
            Resource::Error(message) => Resource::Error(message),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Resource<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Resource::Success(data),
            Err(e) => Resource::Error(e.to_string()),
        }
    }
}
