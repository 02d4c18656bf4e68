//! Helper macros used across the crate.

/// Returns early with `Err($error)` when `$predicate` does not hold.
///
/// Like `assert!`, but for conditions the peer can violate, so it reports instead of
/// panicking:
///
/// ```ignore
/// ensure!(buf.len() <= max, SessionError::request_too_large(buf.len(), max));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
