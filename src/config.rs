//! # Configuration
//!
//! Settings live in a TOML file under a `[screwie]` table:
//!
//! ```toml
//! [screwie]
//! bot_token = "123456:ABC..."
//! allowed_users = "123 456"
//! timezone = "Europe/Berlin"
//! delete_temp_files = true
//! printer_script = "lp -d receipt"
//! # log_level = "INFO"
//! ```
//!
//! ## Discovery
//!
//! Without `--config`, every existing file of these is read in order, and keys
//! in later files override the same keys in earlier ones:
//!
//! 1. `etc/screwie.toml` (relative to the working directory)
//! 2. `~/.config/screwie.toml`
//! 3. `screwie.toml` next to the executable

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::access::AccessPolicy;
use crate::dispatch::{PrintDispatcher, PrinterCommand};
use crate::error::ScrewieError;
use crate::render::font::{TtfTypeface, Typeface};
use crate::render::layout::{DEFAULT_PADDING, DEFAULT_SPACING, DEFAULT_WIDTH};
use crate::render::RenderSpec;

pub const CONFIG_FILE: &str = "screwie.toml";
pub const CONFIG_SECTION: &str = "screwie";

pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// `allowed_users` as either `"123 456"` or `[123, 456]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AllowedUsers {
    List(String),
    Ids(Vec<i64>),
}

impl Default for AllowedUsers {
    fn default() -> Self {
        AllowedUsers::List(String::new())
    }
}

/// Contents of the `[screwie]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bot_token: Option<String>,
    pub allowed_users: AllowedUsers,
    /// IANA zone name for the receipt timestamp
    pub timezone: String,
    pub delete_temp_files: bool,
    /// Printer command; the image path is appended
    pub printer_script: Option<String>,
    pub log_level: Option<String>,

    pub width: u32,
    pub padding: u32,
    pub spacing: u32,
    pub font_path: PathBuf,
    pub font_size: f32,
    /// Directory for rendered images (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_users: AllowedUsers::default(),
            timezone: "UTC".to_string(),
            delete_temp_files: true,
            printer_script: None,
            log_level: None,
            width: DEFAULT_WIDTH,
            padding: DEFAULT_PADDING,
            spacing: DEFAULT_SPACING,
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            font_size: DEFAULT_FONT_SIZE,
            temp_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    screwie: Option<Config>,
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ScrewieError> {
        let table = contents
            .parse::<toml::Table>()
            .map_err(|e| ScrewieError::Config(e.to_string()))?;
        Self::from_table(table)
    }

    fn from_table(table: toml::Table) -> Result<Self, ScrewieError> {
        let file = toml::Value::Table(table)
            .try_into::<ConfigFile>()
            .map_err(|e| ScrewieError::Config(e.to_string()))?;
        file.screwie.ok_or_else(|| {
            ScrewieError::Config(format!("missing [{}] section", CONFIG_SECTION))
        })
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ScrewieError> {
        Self::from_table(read_table(path)?).map_err(|e| with_path(path, e))
    }

    /// Load `paths` in order, later files overriding keys set by earlier ones.
    pub fn load_layered(paths: &[PathBuf]) -> Result<Self, ScrewieError> {
        let mut merged = toml::Table::new();
        for path in paths {
            merge_tables(&mut merged, read_table(path)?);
        }
        Self::from_table(merged)
    }

    /// Load from `explicit` if given, else from every discovered file.
    ///
    /// Returns the config and the paths it was read from.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Vec<PathBuf>), ScrewieError> {
        match explicit {
            Some(path) => Ok((Self::load_from(path)?, vec![path.to_path_buf()])),
            None => load_candidates(&candidate_paths(), false),
        }
    }

    /// Like [`Config::load`], but falls back to the defaults when no file is
    /// found. A file that exists and fails to parse is still an error.
    pub fn load_or_default(
        explicit: Option<&Path>,
    ) -> Result<(Self, Vec<PathBuf>), ScrewieError> {
        match explicit {
            Some(path) => Ok((Self::load_from(path)?, vec![path.to_path_buf()])),
            None => load_candidates(&candidate_paths(), true),
        }
    }

    pub fn bot_token(&self) -> Result<&str, ScrewieError> {
        self.bot_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ScrewieError::Config("bot_token is required".to_string()))
    }

    pub fn access_policy(&self) -> Result<AccessPolicy, ScrewieError> {
        match &self.allowed_users {
            AllowedUsers::List(list) => AccessPolicy::parse(list),
            AllowedUsers::Ids(ids) => Ok(AccessPolicy::new(ids.iter().copied())),
        }
    }

    pub fn timezone(&self) -> Result<Tz, ScrewieError> {
        self.timezone.trim().parse::<Tz>().map_err(|_| {
            ScrewieError::Config(format!("unknown timezone '{}'", self.timezone))
        })
    }

    pub fn printer_command(&self) -> Result<PrinterCommand, ScrewieError> {
        let script = self
            .printer_script
            .as_deref()
            .ok_or_else(|| ScrewieError::Config("printer_script is required".to_string()))?;
        PrinterCommand::parse(script)
    }

    pub fn dispatcher(&self) -> Result<PrintDispatcher, ScrewieError> {
        let dispatcher = PrintDispatcher::new(self.printer_command()?);
        Ok(match &self.temp_dir {
            Some(dir) => dispatcher.with_temp_dir(dir),
            None => dispatcher,
        })
    }

    /// Load the configured font. Failure here is fatal.
    pub fn load_typeface(&self) -> Result<TtfTypeface, ScrewieError> {
        TtfTypeface::load(&self.font_path, self.font_size)
    }

    /// Build the render settings around an already loaded font.
    pub fn render_spec(&self, font: Arc<dyn Typeface>) -> Result<RenderSpec, ScrewieError> {
        if self.width == 0 {
            return Err(ScrewieError::Config("width must be positive".to_string()));
        }
        if self.padding.saturating_mul(2) >= self.width {
            return Err(ScrewieError::Config(format!(
                "padding {} leaves no room for text in width {}",
                self.padding, self.width
            )));
        }
        Ok(RenderSpec {
            width: self.width,
            padding: self.padding,
            spacing: self.spacing,
            font,
            timezone: self.timezone()?,
            keep_temp_files: !self.delete_temp_files,
        })
    }
}

fn load_candidates(
    candidates: &[PathBuf],
    allow_default: bool,
) -> Result<(Config, Vec<PathBuf>), ScrewieError> {
    let found: Vec<PathBuf> = candidates.iter().filter(|p| p.is_file()).cloned().collect();
    if !found.is_empty() {
        return Ok((Config::load_layered(&found)?, found));
    }
    if allow_default {
        return Ok((Config::default(), found));
    }
    Err(ScrewieError::Config(format!(
        "no configuration file found (looked in {})",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

fn read_table(path: &Path) -> Result<toml::Table, ScrewieError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ScrewieError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    contents
        .parse::<toml::Table>()
        .map_err(|e| ScrewieError::Config(format!("{}: {}", path.display(), e)))
}

fn with_path(path: &Path, error: ScrewieError) -> ScrewieError {
    match error {
        ScrewieError::Config(reason) => {
            ScrewieError::Config(format!("{}: {}", path.display(), reason))
        }
        other => other,
    }
}

/// Merge `overlay` into `base`; nested tables merge key by key.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Config file locations, lowest precedence first.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![Path::new("etc").join(CONFIG_FILE)];

    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config").join(CONFIG_FILE));
    }

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(CONFIG_FILE));
    }

    paths
}
