//! Splitting the adaptor selection off the invocation arguments.
//!
//! `--adaptor <vendor>` is ours; everything else belongs to the command-line
//! parser of the build driver, which would reject the flag as unknown. The
//! split happens before that parser ever runs.
//!
//! Arguments are OS strings: paths on the command line need not be UTF-8.
//! Only the vendor name itself has to be.

use std::ffi::{OsStr, OsString};

use crate::core::adaptor::Adaptor;
use crate::resolver::ResolveError;
use crate::util::diagnostic::Diagnostic;

/// The flag that selects the vendor.
pub const ADAPTOR_FLAG: &str = "--adaptor";

/// Result of pulling `--adaptor` out of the argument list.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Selected adaptor (`nvidia` when none was given)
    pub adaptor: Adaptor,
    /// Arguments with the selection tokens removed, order preserved
    pub remaining: Vec<OsString>,
    /// Non-fatal notices produced along the way
    pub diagnostics: Vec<Diagnostic>,
}

/// Split `--adaptor <vendor>` off `args`.
///
/// Only the first occurrence of the flag is considered. A flag with no
/// following token is dropped with a warning and the default adaptor is used.
/// An unknown vendor name is an error; nothing else has been looked at yet.
pub fn extract_adaptor<I, S>(args: I) -> Result<Extraction, ResolveError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut remaining: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let mut diagnostics = Vec::new();

    let flag = OsStr::new(ADAPTOR_FLAG);
    let Some(index) = remaining.iter().position(|a| a == flag) else {
        return Ok(Extraction {
            adaptor: Adaptor::default(),
            remaining,
            diagnostics,
        });
    };

    remaining.remove(index);

    let adaptor = if index < remaining.len() {
        let value = remaining.remove(index);
        value
            .into_string()
            .map_err(|v| ResolveError::invalid_adaptor(v.to_string_lossy()))?
            .parse::<Adaptor>()?
    } else {
        diagnostics.push(
            Diagnostic::warning(format!(
                "no adaptor provided after `{}`, using default {} adaptor",
                ADAPTOR_FLAG,
                Adaptor::default()
            ))
            .with_suggestion(format!("pass one of: {}", Adaptor::names())),
        );
        Adaptor::default()
    };

    Ok(Extraction {
        adaptor,
        remaining,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<OsString> {
        tokens.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_no_flag_leaves_args_unchanged() {
        let input = args(&["build_ext", "--inplace"]);
        let ext = extract_adaptor(input.clone()).unwrap();

        assert_eq!(ext.adaptor, Adaptor::Nvidia);
        assert_eq!(ext.remaining, input);
        assert!(ext.diagnostics.is_empty());
    }

    #[test]
    fn test_flag_and_value_are_removed() {
        let ext = extract_adaptor(args(&["--adaptor", "enflame", "build_ext"])).unwrap();

        assert_eq!(ext.adaptor, Adaptor::Enflame);
        assert_eq!(ext.remaining, args(&["build_ext"]));
    }

    #[test]
    fn test_flag_in_the_middle() {
        let ext =
            extract_adaptor(args(&["-v", "--adaptor", "cambricon", "flags", "--json"])).unwrap();

        assert_eq!(ext.adaptor, Adaptor::Cambricon);
        assert_eq!(ext.remaining, args(&["-v", "flags", "--json"]));
    }

    #[test]
    fn test_trailing_flag_warns_and_defaults() {
        let ext = extract_adaptor(args(&["build_ext", "--adaptor"])).unwrap();

        assert_eq!(ext.adaptor, Adaptor::Nvidia);
        assert_eq!(ext.remaining, args(&["build_ext"]));
        assert_eq!(ext.diagnostics.len(), 1);
        assert!(ext.diagnostics[0]
            .format(false)
            .contains("no adaptor provided after `--adaptor`"));
    }

    #[test]
    fn test_unknown_value_is_rejected() {
        let err = extract_adaptor(args(&["--adaptor", "ascend", "build_ext"])).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidAdaptor { ref value, .. } if value == "ascend"));
    }

    #[test]
    fn test_value_is_taken_verbatim() {
        // The token after the flag is always the value, even if it looks like a flag.
        let err = extract_adaptor(args(&["--adaptor", "--inplace"])).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidAdaptor { .. }));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let first = extract_adaptor(args(&["--adaptor", "iluvatar_corex", "build_ext"])).unwrap();
        let second = extract_adaptor(first.remaining.clone()).unwrap();

        assert_eq!(second.remaining, first.remaining);
        assert!(second.diagnostics.is_empty());
        assert!(!second.remaining.iter().any(|a| a == ADAPTOR_FLAG));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_arguments_pass_through() {
        use std::os::unix::ffi::OsStringExt;

        let plugin_dir = OsString::from_vec(b"/t\xff".to_vec());
        let input = vec![
            OsString::from("flags"),
            OsString::from("--plugin-dir"),
            plugin_dir.clone(),
            OsString::from("--adaptor"),
            OsString::from("enflame"),
        ];

        let ext = extract_adaptor(input).unwrap();
        assert_eq!(ext.adaptor, Adaptor::Enflame);
        assert_eq!(
            ext.remaining,
            vec![OsString::from("flags"), OsString::from("--plugin-dir"), plugin_dir]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_adaptor_is_rejected() {
        use std::os::unix::ffi::OsStringExt;

        let input = vec![
            OsString::from("--adaptor"),
            OsString::from_vec(b"nv\xffidia".to_vec()),
        ];

        let err = extract_adaptor(input).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidAdaptor { .. }));
    }
}
