pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

/// Fails with `InvalidState` naming the builder `operation` when the protocol
/// condition does not hold.
#[macro_export]
macro_rules! verify_state {
    ($operation:expr, $expr:expr, $($msg:tt)+) => {{
        if !$expr {
            return Err($crate::error::Error::invalid_state($operation, format!($($msg)+)));
        }
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
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_format(name, condition)
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
pub fn invalid_format(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidFormat {
        element: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn check_len(len: usize) -> super::Result<usize> {
        verify_arg!(len, len >= 4);
        Ok(len)
    }

    fn check_state(depth: usize) -> super::Result<()> {
        verify_state!("end_object", depth > 0, "no object pending (depth {depth})");
        Ok(())
    }

    #[test]
    fn test_verify_macros() {
        assert_eq!(check_len(8).unwrap(), 8);
        let err = check_len(2).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "len");
                assert_eq!(message, "len >= 4");
            }
            other => panic!("unexpected error kind {other:?}"),
        }

        assert!(check_state(1).is_ok());
        let err = check_state(0).unwrap_err();
        assert!(err.is_invalid_state());
        assert!(err.to_string().contains("depth 0"));
    }
}
