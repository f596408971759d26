//! Support functions called by `#[proxyable]`-generated code.

use veneer_sdk::{Failure, FromValue, Value};

/// Decode argument `index`
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, Failure> {
    let value = args
        .get(index)
        .ok_or_else(|| Failure::msg(format!("missing argument {}", index)))?;
    T::from_value(value).map_err(Failure::raise)
}

/// Finish a typed call whose method declares no error type.
///
/// A captured panic resumes unwinding with its original payload; any other
/// failure cannot be expressed in the method's signature and panics.
pub fn complete<R: FromValue>(result: Result<Value, Failure>, method: &'static str) -> R {
    match result {
        Ok(value) => decode(&value, method),
        Err(failure) => unwind(failure, method),
    }
}

/// Finish a typed call of a method returning `Result<R, E>`.
///
/// A failure carrying an `E` comes back as `Err(e)`.
pub fn complete_fallible<R, E>(result: Result<Value, Failure>, method: &'static str) -> Result<R, E>
where
    R: FromValue,
    E: std::error::Error + 'static,
{
    match result {
        Ok(value) => Ok(decode(&value, method)),
        Err(failure) => match failure.downcast::<E>() {
            Ok(error) => Err(error),
            Err(failure) => unwind(failure, method),
        },
    }
}

fn decode<R: FromValue>(value: &Value, method: &'static str) -> R {
    match R::from_value(value) {
        Ok(decoded) => decoded,
        Err(e) => panic!("proxy method '{}' produced an incompatible value: {}", method, e),
    }
}

fn unwind(failure: Failure, method: &'static str) -> ! {
    match failure.into_panic_payload() {
        Ok(payload) => std::panic::resume_unwind(payload),
        Err(failure) => panic!("undeclared failure from proxy method '{}': {}", method, failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("out of stock")]
    struct OutOfStock;

    #[test]
    fn test_arg_decoding() {
        let args = [Value::Int(3), Value::Str("a".to_string())];
        assert_eq!(arg::<u8>(&args, 0).unwrap(), 3);
        assert!(arg::<u8>(&args, 1).is_err());
        assert!(arg::<u8>(&args, 2).is_err());
    }

    #[test]
    fn test_complete_fallible() {
        let ok: Result<u32, OutOfStock> = complete_fallible(Ok(Value::UInt(4)), "take");
        assert_eq!(ok, Ok(4));

        let err: Result<u32, OutOfStock> = complete_fallible(Err(Failure::raise(OutOfStock)), "take");
        assert_eq!(err, Err(OutOfStock));
    }

    #[test]
    fn test_undeclared_failure_panics() {
        let caught = catch_unwind(|| complete::<u32>(Err(Failure::msg("denied")), "take"));
        let payload = caught.unwrap_err();
        let message = payload.downcast_ref::<String>().unwrap();
        assert!(message.contains("undeclared failure"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_panic_resumes_payload() {
        let original = catch_unwind(|| panic!("original")).unwrap_err();
        let caught = catch_unwind(AssertUnwindSafe(|| complete::<()>(Err(Failure::from_panic(original)), "take")));
        let payload = caught.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"original"));
    }
}
