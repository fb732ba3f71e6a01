pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Fails with `InvalidArgument` naming the argument and the violated condition.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

/// Fails with `InvalidFormat` naming the element and the violated condition.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, &$name.to_string(), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[inline]
pub fn verify_data(predicate: bool, element: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_format(element, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
pub fn invalid_format(element: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidFormat {
        element: element.to_string(),
        message: format!("check failed: {condition}"),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::{Result, error::ErrorKind};

    fn check_shards(shard_count: usize) -> Result<()> {
        verify_arg!(shard_count, shard_count > 0);
        Ok(())
    }

    fn check_location(location: &str, fields: usize) -> Result<()> {
        verify_data!(location, fields == 4);
        Ok(())
    }

    #[test]
    fn test_verify_macros() {
        assert!(check_shards(3).is_ok());
        let err = check_shards(0).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { name, .. } if name == "shard_count"));

        let err = check_location("terms.txt:12", 3).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidFormat { element, message } => {
                assert_eq!(element, "terms.txt:12");
                assert!(message.contains("fields == 4"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
