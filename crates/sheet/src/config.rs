use std::path::PathBuf;
use std::str::FromStr;

/// Settings read from the environment, overridable per command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetConfig {
    /// Content directory used when `--content` is not given.
    pub content_dir: PathBuf,
    /// Overrides the content's `engine.max_passes` when set.
    pub max_passes: Option<usize>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("crates/rules/content/data/hybrid-d20"),
            max_passes: None,
        }
    }
}

impl SheetConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("SHEET_CONTENT_DIR") {
            config.content_dir = dir;
        }

        if let Some(passes) = read_env::<usize>("SHEET_MAX_PASSES") {
            config.max_passes = Some(passes.max(1));
        }

        config
    }

    /// `explicit` if given, otherwise the configured directory.
    pub fn content_dir(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.content_dir.clone())
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
