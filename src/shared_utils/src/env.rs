use std::str::FromStr;

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// An environment variable is set but could not be parsed into the wanted type.
#[derive(Debug, Error)]
#[error("Invalid value for environment variable {name}: {value:?}")]
pub struct InvalidEnvVarError {
    /// Name of the offending variable.
    pub name: String,
    /// The raw value that failed to parse.
    pub value: String,
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Empty values are treated as missing, since an empty `NASA_API_KEY=` line in a
/// `.env` file is never what the caller meant.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset, and an error when it is set
/// to something `T` cannot parse.
pub fn get_env_parsed<T: FromStr>(name: &str) -> Result<Option<T>, InvalidEnvVarError> {
    match get_env_var(name) {
        Err(_) => Ok(None),
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| InvalidEnvVarError {
            name: name.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // SAFETY (all tests): env mutation is serialized through `#[serial]`.

    #[test]
    #[serial]
    fn missing_and_empty_are_both_errors() {
        unsafe {
            std::env::remove_var("SHARED_UTILS_TEST_VAR");
        }
        assert!(get_env_var("SHARED_UTILS_TEST_VAR").is_err());

        unsafe {
            std::env::set_var("SHARED_UTILS_TEST_VAR", "  ");
        }
        let err = get_env_var("SHARED_UTILS_TEST_VAR").unwrap_err();
        assert_eq!(err.0, "SHARED_UTILS_TEST_VAR");

        unsafe {
            std::env::remove_var("SHARED_UTILS_TEST_VAR");
        }
    }

    #[test]
    #[serial]
    fn parsed_values_round_through_from_str() {
        unsafe {
            std::env::set_var("SHARED_UTILS_TEST_NUM", "42");
        }
        assert_eq!(get_env_parsed::<u32>("SHARED_UTILS_TEST_NUM").unwrap(), Some(42));

        unsafe {
            std::env::set_var("SHARED_UTILS_TEST_NUM", "forty-two");
        }
        let err = get_env_parsed::<u32>("SHARED_UTILS_TEST_NUM").unwrap_err();
        assert_eq!(err.value, "forty-two");

        unsafe {
            std::env::remove_var("SHARED_UTILS_TEST_NUM");
        }
        assert_eq!(get_env_parsed::<u32>("SHARED_UTILS_TEST_NUM").unwrap(), None);
    }
}
