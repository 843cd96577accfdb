//! `${VAR}` substitution in path settings.

use crate::ConfigError;

/// Expand `${VAR}` references in `value`.
///
/// Values without `${` are returned as written, so a lone `$` in a path
/// needs no escaping.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, MissingVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| MissingVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a referenced variable that is not set.
struct MissingVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: each test touches only its own variable.
        unsafe {
            std::env::set_var("VELLUM_EXPAND_SIMPLE", "/srv/docs");
        }
        let result = expand_env("${VELLUM_EXPAND_SIMPLE}", "docs.source_dir").unwrap();
        assert_eq!(result, "/srv/docs");
        unsafe {
            std::env::remove_var("VELLUM_EXPAND_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: each test touches only its own variable.
        unsafe {
            std::env::remove_var("VELLUM_EXPAND_UNSET");
        }
        let result = expand_env("${VELLUM_EXPAND_UNSET:-docs}", "docs.source_dir").unwrap();
        assert_eq!(result, "docs");
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: each test touches only its own variable.
        unsafe {
            std::env::set_var("VELLUM_EXPAND_HOME", "/home/user");
        }
        let result = expand_env("${VELLUM_EXPAND_HOME}/.cache/vellum", "cache.dir").unwrap();
        assert_eq!(result, "/home/user/.cache/vellum");
        unsafe {
            std::env::remove_var("VELLUM_EXPAND_HOME");
        }
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: each test touches only its own variable.
        unsafe {
            std::env::remove_var("VELLUM_EXPAND_MISSING");
        }
        let err = expand_env("${VELLUM_EXPAND_MISSING}", "cache.dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("VELLUM_EXPAND_MISSING"));
        assert!(err.to_string().contains("cache.dir"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("docs/$draft", "docs.source_dir").unwrap();
        assert_eq!(result, "docs/$draft");
    }
}
