//! Build fingerprinting for incremental builds.
//!
//! A fingerprint captures every input of the extension build: the exact
//! compile and link command lines, the contents of the sources and of every
//! header under the plugin's own include directories. When it matches the one
//! stored next to the objects and the module exists, the build is skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::builder::toolchain::CommandSpec;
use crate::util::hash::{sha256_file, Fingerprint};

/// Fingerprint of one extension build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFingerprint {
    /// Hash over all command lines, in execution order
    pub commands_hash: String,

    /// Source file hashes
    pub source_hashes: BTreeMap<PathBuf, String>,

    /// Header file hashes
    #[serde(default)]
    pub header_hashes: BTreeMap<PathBuf, String>,
}

/// Extensions treated as headers when scanning include directories.
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "inl", "cuh"];

/// All headers below `dirs`, sorted. Missing directories contribute nothing.
pub fn find_headers(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut headers: Vec<PathBuf> = dirs
        .iter()
        .flat_map(|dir| WalkDir::new(dir).follow_links(true).into_iter())
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| HEADER_EXTENSIONS.contains(&e))
        })
        .collect();
    headers.sort();
    headers.dedup();
    headers
}

impl BuildFingerprint {
    /// Fingerprint the given commands, sources and headers.
    ///
    /// Missing files are left out; the compiler reports them.
    pub fn compute(
        commands: &[CommandSpec],
        sources: &[PathBuf],
        headers: &[PathBuf],
    ) -> Result<Self> {
        let mut fp = Fingerprint::new();
        for cmd in commands {
            fp.update_str(&cmd.program.to_string_lossy())
                .update_str(&cmd.args.len().to_string())
                .update_strs(cmd.args.iter().map(String::as_str));
        }

        Ok(BuildFingerprint {
            commands_hash: fp.finish(),
            source_hashes: hash_files(sources)?,
            header_hashes: hash_files(headers)?,
        })
    }

    /// Load a stored fingerprint. Unreadable or stale-format files count as absent.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(fp) => Some(fp),
            Err(e) => {
                tracing::debug!("ignoring fingerprint {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Store the fingerprint.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("failed to serialize fingerprint")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write fingerprint: {}", path.display()))
    }
}

fn hash_files(paths: &[PathBuf]) -> Result<BTreeMap<PathBuf, String>> {
    let mut hashes = BTreeMap::new();
    for path in paths {
        if path.exists() {
            hashes.insert(path.clone(), sha256_file(path)?);
        }
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_tracks_commands_and_sources() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("backend_flagcx.cpp");
        std::fs::write(&source, "int x;").unwrap();

        let cmds = vec![CommandSpec::new("g++").arg("-DUSE_NVIDIA_ADAPTOR")];
        let first = BuildFingerprint::compute(&cmds, &[source.clone()], &[]).unwrap();
        let again = BuildFingerprint::compute(&cmds, &[source.clone()], &[]).unwrap();
        assert_eq!(first, again);

        let other_cmds = vec![CommandSpec::new("g++").arg("-DUSE_ENFLAME_ADAPTOR")];
        let switched = BuildFingerprint::compute(&other_cmds, &[source.clone()], &[]).unwrap();
        assert_ne!(first, switched);

        std::fs::write(&source, "int y;").unwrap();
        let edited = BuildFingerprint::compute(&cmds, &[source], &[]).unwrap();
        assert_ne!(first, edited);
    }

    #[test]
    fn test_fingerprint_tracks_headers() {
        let tmp = TempDir::new().unwrap();
        let include = tmp.path().join("include");
        std::fs::create_dir_all(include.join("detail")).unwrap();
        std::fs::write(include.join("backend_flagcx.hpp"), "#pragma once").unwrap();
        std::fs::write(include.join("detail/utils.h"), "int f();").unwrap();
        std::fs::write(include.join("README.md"), "docs").unwrap();

        let headers = find_headers(&[include.clone(), tmp.path().join("missing")]);
        assert_eq!(
            headers,
            vec![
                include.join("backend_flagcx.hpp"),
                include.join("detail/utils.h"),
            ]
        );

        let cmds = vec![CommandSpec::new("g++")];
        let first = BuildFingerprint::compute(&cmds, &[], &headers).unwrap();

        std::fs::write(include.join("detail/utils.h"), "int g();").unwrap();
        let edited = BuildFingerprint::compute(&cmds, &[], &headers).unwrap();
        assert_ne!(first, edited);
    }

    #[test]
    fn test_fingerprint_keeps_arguments_apart() {
        let joined = vec![CommandSpec::new("g++").arg("-DNAME=a b")];
        let split = vec![CommandSpec::new("g++").arg("-DNAME=a").arg("b")];

        assert_ne!(
            BuildFingerprint::compute(&joined, &[], &[]).unwrap(),
            BuildFingerprint::compute(&split, &[], &[]).unwrap()
        );
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("flagcx.fingerprint.json");

        let fp = BuildFingerprint::compute(&[CommandSpec::new("g++")], &[], &[]).unwrap();
        fp.save(&path).unwrap();

        assert_eq!(BuildFingerprint::load(&path), Some(fp));
    }

    #[test]
    fn test_load_garbage_is_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fp.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(BuildFingerprint::load(&path), None);
        assert_eq!(BuildFingerprint::load(&tmp.path().join("missing")), None);
    }
}
