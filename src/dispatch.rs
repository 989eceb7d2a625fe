//! # Print Dispatch
//!
//! Hands a rendered canvas to the external printer program:
//!
//! 1. Create a uniquely named temp file (`screwie-XXXXXX.png`)
//! 2. Write the canvas to it as PNG
//! 3. Spawn `<printer_script tokens...> <temp file>` without waiting for it
//!
//! The printer program is an opaque sink: its exit status and output are never
//! inspected. A failure to start it is logged and reported as
//! [`DispatchOutcome::LaunchFailed`], never as an error.
//!
//! ## Temp File Lifetime
//!
//! Retention is decided per call by the caller, normally from
//! [`RenderSpec::keep_temp_files`](crate::render::RenderSpec::keep_temp_files).
//! Without retention the file is owned by a guard that deletes it when
//! [`PrintDispatcher::dispatch`] returns, on every path. With retention the
//! file is persisted before the printer is started and left on disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::NamedTempFile;

use crate::error::ScrewieError;
use crate::render::Canvas;

const TEMP_PREFIX: &str = "screwie-";
const TEMP_SUFFIX: &str = ".png";

/// External printer command; the image path is appended as the last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterCommand {
    program: String,
    args: Vec<String>,
}

impl PrinterCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a `printer_script` value on whitespace, e.g. `"lp -d receipt -o raw"`.
    ///
    /// ## Errors
    ///
    /// Returns [`ScrewieError::Command`] if the script has no tokens.
    pub fn parse(script: &str) -> Result<Self, ScrewieError> {
        let mut tokens = script.split_whitespace().map(String::from);
        let program = tokens
            .next()
            .ok_or_else(|| ScrewieError::Command("printer_script is empty".to_string()))?;
        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument vector for printing `image`, program first.
    pub fn argv(&self, image: &Path) -> Vec<OsString> {
        std::iter::once(OsString::from(&self.program))
            .chain(self.args.iter().map(OsString::from))
            .chain(std::iter::once(image.as_os_str().to_os_string()))
            .collect()
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Printer program started.
    Dispatched {
        image: PathBuf,
        pid: Option<u32>,
    },
    /// Printer program could not be started.
    LaunchFailed(String),
    /// Canvas could not be written to a temp file; nothing was started.
    SerializationFailed(String),
}

impl DispatchOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, DispatchOutcome::Dispatched { .. })
    }
}

/// Writes canvases to temp files and starts the printer program on them.
#[derive(Debug, Clone)]
pub struct PrintDispatcher {
    command: PrinterCommand,
    temp_dir: Option<PathBuf>,
}

impl PrintDispatcher {
    pub fn new(command: PrinterCommand) -> Self {
        Self {
            command,
            temp_dir: None,
        }
    }

    /// Create temp files in `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn command(&self) -> &PrinterCommand {
        &self.command
    }

    /// Serialize `canvas` and start the printer on it, leaving the image on
    /// disk afterwards if `keep_file` is set.
    ///
    /// Must be called from within a Tokio runtime, which reaps the child
    /// process after it exits.
    pub fn dispatch(&self, canvas: &Canvas, keep_file: bool) -> DispatchOutcome {
        let mut file = match self.create_temp_file() {
            Ok(file) => file,
            Err(e) => {
                tracing::error!("Failed to create temporary file: {}", e);
                return DispatchOutcome::SerializationFailed(e.to_string());
            }
        };

        if let Err(e) = canvas.write_png(file.as_file_mut()) {
            tracing::error!("Failed to write image to {}: {}", file.path().display(), e);
            return DispatchOutcome::SerializationFailed(e.to_string());
        }
        tracing::info!("Image saved to temporary file: {}", file.path().display());

        // The guard (if any) lives until the end of this function.
        let (image, _guard) = if keep_file {
            match file.keep() {
                Ok((_, path)) => (path, None),
                Err(e) => {
                    tracing::error!("Failed to keep temporary file: {}", e);
                    return DispatchOutcome::SerializationFailed(e.to_string());
                }
            }
        } else {
            (file.path().to_path_buf(), Some(file))
        };

        self.launch(image)
    }

    fn create_temp_file(&self) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(TEMP_SUFFIX);
        match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }

    fn launch(&self, image: PathBuf) -> DispatchOutcome {
        let argv = self.command.argv(&image);
        tracing::info!("Calling external program: {:?}", argv);

        let spawned = tokio::process::Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .kill_on_drop(false)
            .spawn();

        match spawned {
            Ok(child) => DispatchOutcome::Dispatched {
                image,
                pid: child.id(),
            },
            Err(e) => {
                tracing::error!("Failed to call external program: {}", e);
                DispatchOutcome::LaunchFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new(384, 48);
        canvas.set_black(20, 20);
        canvas
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn test_parse_printer_script() {
        let cmd = PrinterCommand::parse("  lp -d receipt\t-o raw ").unwrap();
        assert_eq!(cmd.program(), "lp");
        assert_eq!(
            cmd.argv(Path::new("/tmp/x.png")),
            vec!["lp", "-d", "receipt", "-o", "raw", "/tmp/x.png"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_parse_empty_printer_script() {
        assert!(matches!(
            PrinterCommand::parse("   "),
            Err(ScrewieError::Command(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_deletes_file_when_not_kept() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher =
            PrintDispatcher::new(PrinterCommand::parse("true").unwrap()).with_temp_dir(dir.path());

        let outcome = dispatcher.dispatch(&canvas(), false);
        let DispatchOutcome::Dispatched { image, .. } = outcome else {
            panic!("expected dispatch, got {outcome:?}");
        };
        assert!(image.starts_with(dir.path()));
        assert!(!image.exists());
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_keeps_valid_png() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher =
            PrintDispatcher::new(PrinterCommand::parse("true").unwrap()).with_temp_dir(dir.path());

        let outcome = dispatcher.dispatch(&canvas(), true);
        let DispatchOutcome::Dispatched { image, .. } = outcome else {
            panic!("expected dispatch, got {outcome:?}");
        };
        assert!(image.exists());
        let name = image.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("screwie-") && name.ends_with(".png"), "{name}");

        let decoded = image::open(&image).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (384, 48));
        assert_eq!(decoded.get_pixel(20, 20).0, [0]);
    }

    #[tokio::test]
    async fn test_launch_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let command = PrinterCommand::parse("/nonexistent/screwie-printer --flag").unwrap();
        let dispatcher = PrintDispatcher::new(command).with_temp_dir(dir.path());

        let outcome = dispatcher.dispatch(&canvas(), false);
        assert!(matches!(outcome, DispatchOutcome::LaunchFailed(_)), "{outcome:?}");
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_serialization_failure_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher =
            PrintDispatcher::new(PrinterCommand::parse("true").unwrap()).with_temp_dir(dir.path());

        let outcome = dispatcher.dispatch(&Canvas::new(0, 0), false);
        assert!(matches!(outcome, DispatchOutcome::SerializationFailed(_)), "{outcome:?}");
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_temp_dir_is_serialization_failure() {
        let dispatcher = PrintDispatcher::new(PrinterCommand::parse("true").unwrap())
            .with_temp_dir("/nonexistent/screwie-tmp");
        let outcome = dispatcher.dispatch(&canvas(), false);
        assert!(matches!(outcome, DispatchOutcome::SerializationFailed(_)));
    }
}
