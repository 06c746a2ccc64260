use crate::common::error::ScmClientError;

/// Result alias used across every SCM client operation.
///
/// # Examples
///
/// ```
/// use scm_bridge::common::result::ScmResult;
/// use scm_bridge::common::error::ScmClientError;
///
/// fn example_function() -> ScmResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> ScmResult<()> {
///     Err(ScmClientError::not_found("docs/missing.md"))
/// }
/// ```
pub type ScmResult<T> = Result<T, ScmClientError>;

/// Helpers on results that already carry a [`ScmClientError`].
pub trait ScmResultExt<T> {
    /// Replace a `NotFound` error with the result of `f`, leaving every other
    /// outcome untouched.
    fn or_else_not_found<F>(self, f: F) -> ScmResult<T>
    where
        F: FnOnce() -> ScmResult<T>;
}

impl<T> ScmResultExt<T> for ScmResult<T> {
    fn or_else_not_found<F>(self, f: F) -> ScmResult<T>
    where
        F: FnOnce() -> ScmResult<T>,
    {
        match self {
            Err(ScmClientError::NotFound { .. }) => f(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_else_not_found_only_replaces_not_found() {
        let result: ScmResult<u32> = Err(ScmClientError::not_found("a"));
        assert_eq!(result.or_else_not_found(|| Ok(7)).unwrap(), 7);

        let result: ScmResult<u32> = Err(ScmClientError::Canceled);
        assert!(matches!(
            result.or_else_not_found(|| Ok(7)),
            Err(ScmClientError::Canceled)
        ));

        let result: ScmResult<u32> = Ok(1);
        assert_eq!(result.or_else_not_found(|| Ok(7)).unwrap(), 1);
    }
}
