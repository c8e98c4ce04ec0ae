use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Token that turns on 4x multisampling when passed as the second argument.
pub const MSAA_FLAG: &str = "msaa";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing required argument <model_file>")]
    MissingModelPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub model_path: PathBuf,
    pub msaa: bool,
}

impl Args {
    /// Parses the arguments that follow the program name.
    pub fn parse<I>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut args = args.into_iter();
        let model_path = args.next().ok_or(UsageError::MissingModelPath)?.into();
        let msaa = args.next().is_some_and(|flag| flag == MSAA_FLAG);

        Ok(Self { model_path, msaa })
    }

    pub fn context_config(&self) -> ContextConfig {
        ContextConfig {
            msaa_samples: if self.msaa { 4 } else { 1 },
        }
    }
}

/// Settings that have to be fixed before the rendering context exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    pub msaa_samples: u32,
}

/// The path as given on the command line, with invalid UTF-8 replaced.
pub fn raw_path(path: &Path) -> String {
    path.as_os_str().to_string_lossy().into_owned()
}

/// Name shown in the overlay: everything after the last `/`.
pub fn display_name(path: &Path) -> String {
    let raw = raw_path(path);
    match raw.rfind('/') {
        Some(idx) => raw[idx + 1..].to_string(),
        None => raw,
    }
}

pub fn usage(program: &str) -> [String; 2] {
    [
        format!("Usage: {program} <model_file> [msaa]"),
        format!("  {MSAA_FLAG} - Enable 4x MSAA antialiasing"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, UsageError> {
        Args::parse(args.iter().map(OsString::from))
    }

    fn name(path: &str) -> String {
        display_name(Path::new(path))
    }

    #[test]
    fn missing_model_path_is_an_error() {
        assert_eq!(parse(&[]), Err(UsageError::MissingModelPath));
    }

    #[test]
    fn msaa_requires_the_exact_token() {
        assert!(!parse(&["cube.obj"]).unwrap().msaa);
        assert!(parse(&["cube.obj", "msaa"]).unwrap().msaa);
        assert!(!parse(&["cube.obj", "MSAA"]).unwrap().msaa);
        assert!(!parse(&["cube.obj", "--msaa"]).unwrap().msaa);
    }

    #[test]
    fn context_config_follows_msaa_flag() {
        assert_eq!(parse(&["a.obj"]).unwrap().context_config().msaa_samples, 1);
        assert_eq!(
            parse(&["a.obj", "msaa"]).unwrap().context_config().msaa_samples,
            4
        );
    }

    #[test]
    fn display_name_is_last_path_segment() {
        assert_eq!(name("models/props/crate.obj"), "crate.obj");
        assert_eq!(name("/abs/teapot.glb"), "teapot.glb");
        assert_eq!(name("bunny.obj"), "bunny.obj");
        assert_eq!(name("trailing/"), "");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_is_accepted() {
        use std::os::unix::ffi::OsStrExt;

        let path = std::ffi::OsStr::from_bytes(b"models/caf\xe9.obj").to_os_string();
        let args = Args::parse([path.clone(), OsString::from("msaa")]).unwrap();

        assert_eq!(args.model_path.as_os_str(), path);
        assert!(args.msaa);
        assert_eq!(display_name(&args.model_path), "caf\u{FFFD}.obj");
        assert_eq!(raw_path(&args.model_path), "models/caf\u{FFFD}.obj");
    }

    #[test]
    fn usage_is_two_lines() {
        let lines = usage("viewer");
        assert_eq!(lines[0], "Usage: viewer <model_file> [msaa]");
        assert_eq!(lines[1], "  msaa - Enable 4x MSAA antialiasing");
    }
}
