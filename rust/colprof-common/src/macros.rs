/// Unwraps a `Result` inside an `Iterator<Item = Result<T>>::next` body.
///
/// `Ok(t)` yields `t`; `Err(e)` makes the enclosing `next()` return
/// `Some(Err(e))`, so a record stream reports the failure once and the caller
/// decides whether to keep pulling.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                return Some(Err(err));
            }
        }
    };
}

/// Returns early with an `InvariantViolation` error built from a format string.
#[macro_export]
macro_rules! invariant_violation {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::invariant_violation(format!($($arg)*)))
    };
}
