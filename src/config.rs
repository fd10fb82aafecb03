use std::path::PathBuf;
use std::time::Duration;

/// Import tuning knobs.
///
/// In debug builds `load` also picks up a `.env` file before reading the
/// `LODE_*` environment variables; unset variables fall back to the defaults
/// below.
#[derive(Clone, Debug)]
pub struct ImportConfig {
    /// Base URL of the host application's local web API.
    pub api_base_url: String,
    /// Wait after item creation before fetching the record, to tolerate
    /// host-side indexing latency. Bounded wait, not a retry loop.
    pub settle_delay: Duration,
    /// Pixel size (width and height) requested from the thumbnail tool.
    pub thumbnail_size: u32,
    /// External thumbnail tool, invoked as `<tool> <input> <output> <size>`.
    /// No generation fallback when unset.
    pub thumbnail_tool: Option<PathBuf>,
    /// Trash utility and its fixed arguments; the directory to remove is
    /// appended as the final argument. Empty disables cleanup entirely.
    pub trash_command: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:41595/api".to_string(),
            settle_delay: Duration::from_millis(100),
            thumbnail_size: 400,
            thumbnail_tool: None,
            trash_command: default_trash_command(),
        }
    }
}

impl ImportConfig {
    /// Load configuration from the environment.
    pub fn load() -> Self {
        #[cfg(debug_assertions)]
        {
            if dotenvy::dotenv().is_ok() {
                tracing::debug!("loaded environment overrides from .env");
            }
        }

        Self::from_env()
    }

    fn from_env() -> Self {
        let defaults = Self::default();

        let api_base_url = std::env::var("LODE_API_URL").unwrap_or(defaults.api_base_url);

        let settle_delay = std::env::var("LODE_SETTLE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.settle_delay);

        let thumbnail_size = std::env::var("LODE_THUMBNAIL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.thumbnail_size);

        let thumbnail_tool = std::env::var("LODE_THUMBNAIL_TOOL").ok().map(PathBuf::from);

        let trash_command = std::env::var("LODE_TRASH_COMMAND")
            .ok()
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or(defaults.trash_command);

        Self {
            api_base_url,
            settle_delay,
            thumbnail_size,
            thumbnail_tool,
            trash_command,
        }
    }
}

/// Platform utility that moves a directory to the recoverable trash location.
fn default_trash_command() -> Vec<String> {
    if cfg!(target_os = "windows") {
        vec![
            "pwsh".to_string(),
            "-NoProfile".to_string(),
            "-Command".to_string(),
            "& {Add-Type -AssemblyName Microsoft.VisualBasic; \
             [Microsoft.VisualBasic.FileIO.FileSystem]::DeleteDirectory($args[0], \
             'OnlyErrorDialogs', 'SendToRecycleBin')}"
                .to_string(),
        ]
    } else if cfg!(target_os = "macos") {
        vec!["trash".to_string()]
    } else {
        vec!["gio".to_string(), "trash".to_string()]
    }
}
