//! Small helpers shared across the crate.

/// Returns `Err($error)` from the enclosing function unless `$predicate` holds.
///
/// The `Result` counterpart of `assert!`, used for validating input that can
/// legitimately be wrong.
///
/// ```ignore
/// ensure!(fields < MAX_HEADER_NUM, ParseError::too_many_headers(MAX_HEADER_NUM));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
