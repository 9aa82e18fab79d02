//! GCC/Clang command generation.

use std::path::PathBuf;

use super::{CommandSpec, CompileInput, LinkInput};

/// GCC-style C++ driver (g++, clang++, c++).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GccToolchain {
    /// Path to the C++ compiler
    pub cxx: PathBuf,
}

impl GccToolchain {
    /// Create a new GCC-style toolchain.
    pub fn new(cxx: PathBuf) -> Self {
        GccToolchain { cxx }
    }

    /// Compile one translation unit to a position-independent object.
    pub fn compile_command(&self, input: &CompileInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cxx);

        cmd = cmd.arg("-c").arg("-fPIC");

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        for (name, value) in &input.defines {
            match value {
                Some(v) => cmd = cmd.arg(format!("-D{}={}", name, v)),
                None => cmd = cmd.arg(format!("-D{}", name)),
            }
        }

        cmd = cmd.args(input.cxxflags.iter().cloned());

        cmd = cmd.arg(input.source.display().to_string());
        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        cmd
    }

    /// Link objects into a shared library.
    pub fn link_shared_command(&self, input: &LinkInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cxx);

        cmd = cmd.arg("-shared");

        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        for dir in &input.lib_dirs {
            cmd = cmd.arg(format!("-L{}", dir.display()));
        }

        for lib in &input.libs {
            cmd = cmd.arg(format!("-l{}", lib));
        }

        cmd = cmd.args(input.ldflags.iter().cloned());

        cmd
    }

    /// Object file extension.
    pub fn object_extension(&self) -> &str {
        "o"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain() -> GccToolchain {
        GccToolchain::new(PathBuf::from("/usr/bin/g++"))
    }

    #[test]
    fn test_compile_command_order() {
        let input = CompileInput {
            source: PathBuf::from("src/backend_flagcx.cpp"),
            output: PathBuf::from("build/backend_flagcx.o"),
            include_dirs: vec![PathBuf::from("include"), PathBuf::from("/opt/tops/include")],
            defines: vec![
                ("USE_ENFLAME_ADAPTOR".to_string(), None),
                ("TORCH_EXTENSION_NAME".to_string(), Some("flagcx".to_string())),
            ],
            cxxflags: vec!["-std=c++17".to_string()],
        };

        let cmd = toolchain().compile_command(&input);

        assert_eq!(
            cmd.args,
            vec![
                "-c",
                "-fPIC",
                "-Iinclude",
                "-I/opt/tops/include",
                "-DUSE_ENFLAME_ADAPTOR",
                "-DTORCH_EXTENSION_NAME=flagcx",
                "-std=c++17",
                "src/backend_flagcx.cpp",
                "-o",
                "build/backend_flagcx.o",
            ]
        );
    }

    #[test]
    fn test_link_shared_command_order() {
        let input = LinkInput {
            objects: vec![PathBuf::from("a.o")],
            output: PathBuf::from("flagcx.so"),
            lib_dirs: vec![PathBuf::from("/b/lib"), PathBuf::from("/opt/tops/lib")],
            libs: vec!["flagcx".to_string(), "topsrt".to_string()],
            ldflags: vec!["-Wl,-rpath,/b/lib".to_string()],
        };

        let cmd = toolchain().link_shared_command(&input);

        assert_eq!(cmd.program, PathBuf::from("/usr/bin/g++"));
        assert_eq!(
            cmd.args,
            vec![
                "-shared",
                "-o",
                "flagcx.so",
                "a.o",
                "-L/b/lib",
                "-L/opt/tops/lib",
                "-lflagcx",
                "-ltopsrt",
                "-Wl,-rpath,/b/lib",
            ]
        );
    }
}
