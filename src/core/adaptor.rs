//! Hardware vendor selection.
//!
//! Every FlagCX build targets exactly one vendor backend. The set is closed:
//! adding a vendor means adding a variant here and handling it everywhere the
//! compiler points at a non-exhaustive match.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::resolver::ResolveError;

/// A hardware vendor the extension can be built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adaptor {
    /// NVIDIA GPUs via CUDA / NCCL
    #[default]
    Nvidia,
    /// Iluvatar CoreX GPUs via the CUDA-compatible CoreX SDK
    IluvatarCorex,
    /// Cambricon MLUs via Neuware / CNCL
    Cambricon,
    /// Enflame GCUs via TopsRider / ECCL
    Enflame,
}

impl Adaptor {
    /// All supported adaptors, in the order they are documented.
    pub const ALL: [Adaptor; 4] = [
        Adaptor::Nvidia,
        Adaptor::IluvatarCorex,
        Adaptor::Cambricon,
        Adaptor::Enflame,
    ];

    /// Name accepted after `--adaptor`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Adaptor::Nvidia => "nvidia",
            Adaptor::IluvatarCorex => "iluvatar_corex",
            Adaptor::Cambricon => "cambricon",
            Adaptor::Enflame => "enflame",
        }
    }

    /// Preprocessor symbol that selects this vendor in the C++ sources.
    pub fn define(&self) -> &'static str {
        match self {
            Adaptor::Nvidia => "USE_NVIDIA_ADAPTOR",
            Adaptor::IluvatarCorex => "USE_ILUVATAR_COREX_ADAPTOR",
            Adaptor::Cambricon => "USE_CAMBRICON_ADAPTOR",
            Adaptor::Enflame => "USE_ENFLAME_ADAPTOR",
        }
    }

    /// The define rendered as a compiler flag.
    pub fn define_flag(&self) -> String {
        format!("-D{}", self.define())
    }

    /// Comma-separated list of accepted names, for messages.
    pub fn names() -> String {
        Adaptor::ALL
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Adaptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Adaptor {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nvidia" => Ok(Adaptor::Nvidia),
            "iluvatar_corex" => Ok(Adaptor::IluvatarCorex),
            "cambricon" => Ok(Adaptor::Cambricon),
            "enflame" => Ok(Adaptor::Enflame),
            _ => Err(ResolveError::invalid_adaptor(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for adaptor in Adaptor::ALL {
            assert_eq!(adaptor.as_str().parse::<Adaptor>().unwrap(), adaptor);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("NVIDIA".parse::<Adaptor>().is_err());
        assert!("iluvatar-corex".parse::<Adaptor>().is_err());
    }

    #[test]
    fn test_unknown_adaptor_error() {
        let err = "ascend".parse::<Adaptor>().unwrap_err();
        assert!(matches!(err, ResolveError::InvalidAdaptor { ref value, .. } if value == "ascend"));
        assert!(err.to_string().contains("ascend"));
    }

    #[test]
    fn test_defines_are_distinct() {
        let mut defines: Vec<_> = Adaptor::ALL.iter().map(|a| a.define()).collect();
        defines.sort();
        defines.dedup();
        assert_eq!(defines.len(), Adaptor::ALL.len());
        assert_eq!(Adaptor::Enflame.define_flag(), "-DUSE_ENFLAME_ADAPTOR");
    }

    #[test]
    fn test_default_is_nvidia() {
        assert_eq!(Adaptor::default(), Adaptor::Nvidia);
    }
}
