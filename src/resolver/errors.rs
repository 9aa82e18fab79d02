//! Adaptor resolution errors.
//!
//! All of these are fatal: nothing is built once one has been raised.

use miette::Diagnostic;
use thiserror::Error;

use crate::core::adaptor::Adaptor;

/// Error while selecting or resolving an adaptor.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("unknown adaptor `{value}`")]
    #[diagnostic(code(flagcx::adaptor::invalid))]
    InvalidAdaptor {
        value: String,
        #[help]
        supported: String,
    },

    #[error("`{var}` is not set, but the {adaptor} adaptor needs it")]
    #[diagnostic(
        code(flagcx::env::missing),
        help("export `{var}` before building the {adaptor} adaptor, e.g. `export {var}=<dir>`")
    )]
    MissingEnv { var: &'static str, adaptor: Adaptor },

    #[error("Python package `{package}` could not be located: {reason}")]
    #[diagnostic(
        code(flagcx::package::missing),
        help("install it into the interpreter used for the build, or set `interpreter` under [python] in .flagcx/config.toml")
    )]
    MissingPackage { package: String, reason: String },
}

impl ResolveError {
    /// An unknown adaptor name, with the accepted names as help.
    pub fn invalid_adaptor(value: impl Into<String>) -> Self {
        ResolveError::InvalidAdaptor {
            value: value.into(),
            supported: format!("supported adaptors: {}", Adaptor::names()),
        }
    }

    /// Build a missing-package error from a probe's stderr.
    ///
    /// Python tracebacks end with the interesting line, so only that is kept.
    pub fn missing_package(package: impl Into<String>, stderr: &str) -> Self {
        let reason = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("probe produced no output")
            .to_string();

        ResolveError::MissingPackage {
            package: package.into(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_package_keeps_last_traceback_line() {
        let stderr = "Traceback (most recent call last):\n  File \"<string>\", line 1, in <module>\nModuleNotFoundError: No module named 'torch_gcu'\n\n";
        let err = ResolveError::missing_package("torch_gcu", stderr);

        assert_eq!(
            err.to_string(),
            "Python package `torch_gcu` could not be located: ModuleNotFoundError: No module named 'torch_gcu'"
        );
    }

    #[test]
    fn test_missing_package_with_empty_stderr() {
        let err = ResolveError::missing_package("torch_mlu", "");
        assert!(err.to_string().contains("probe produced no output"));
    }

    #[test]
    fn test_missing_env_message_names_adaptor() {
        let err = ResolveError::MissingEnv {
            var: "NEUWARE_HOME",
            adaptor: Adaptor::Cambricon,
        };
        assert_eq!(
            err.to_string(),
            "`NEUWARE_HOME` is not set, but the cambricon adaptor needs it"
        );
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = ResolveError::invalid_adaptor("x");
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("flagcx::adaptor::invalid")
        );
    }

    #[test]
    fn test_invalid_adaptor_help_lists_every_adaptor() {
        let help = ResolveError::invalid_adaptor("ascend")
            .help()
            .map(|h| h.to_string())
            .unwrap_or_default();

        assert_eq!(
            help,
            "supported adaptors: nvidia, iluvatar_corex, cambricon, enflame"
        );
    }

    #[test]
    fn test_missing_env_help_names_the_variable() {
        let help = |var| {
            ResolveError::MissingEnv {
                var,
                adaptor: Adaptor::Cambricon,
            }
            .help()
            .map(|h| h.to_string())
            .unwrap_or_default()
        };

        assert!(help("PYTORCH_HOME").contains("export PYTORCH_HOME="));
        assert!(!help("PYTORCH_HOME").contains("NEUWARE_HOME"));
        assert!(help("NEUWARE_HOME").contains("export NEUWARE_HOME="));
    }
}
