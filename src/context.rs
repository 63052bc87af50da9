// Where the config file and the logs live. Everything that touches disk goes
// through an `AppContext` so tests can run against a throwaway root.
use anyhow::{Context, Result, anyhow};
use directories::{BaseDirs, ProjectDirs};
use std::fs;
use std::path::{Path, PathBuf};

pub trait AppContext: Send + Sync + std::fmt::Debug {
    fn config_dir(&self) -> Result<PathBuf>;
    fn data_dir(&self) -> Result<PathBuf>;

    fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    fn log_file(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("gcal-tui.log"))
    }

    fn panic_log_file(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("gcal-tui-panic.log"))
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let base = BaseDirs::new().ok_or_else(|| anyhow!("No home directory"))?;
            Ok(base.home_dir().join(rest.trim_start_matches('/')))
        }
        _ => Ok(PathBuf::from(path)),
    }
}

fn created(path: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    Ok(path)
}

/// OS-specific project directories, or `<root>/config` and `<root>/data`
/// when `--root` is given.
#[derive(Clone, Debug)]
pub struct StandardContext {
    root: Option<PathBuf>,
}

impl StandardContext {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, sub: &str, pick: fn(&ProjectDirs) -> &Path) -> Result<PathBuf> {
        let dir = match &self.root {
            Some(root) => root.join(sub),
            None => {
                let proj = ProjectDirs::from("com", "gcal-tui", "gcal-tui")
                    .ok_or_else(|| anyhow!("No home directory"))?;
                pick(&proj).to_path_buf()
            }
        };
        created(dir)
    }
}

impl AppContext for StandardContext {
    fn config_dir(&self) -> Result<PathBuf> {
        self.resolve("config", ProjectDirs::config_dir)
    }

    fn data_dir(&self) -> Result<PathBuf> {
        self.resolve("data", ProjectDirs::data_dir)
    }
}

/// Unique temporary root, removed on drop.
#[derive(Debug)]
pub struct TestContext {
    pub root: PathBuf,
    inner: StandardContext,
}

impl TestContext {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("gcal_tui_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&root).expect("failed to create test root");
        Self {
            inner: StandardContext::new(Some(root.clone())),
            root,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext for TestContext {
    fn config_dir(&self) -> Result<PathBuf> {
        self.inner.config_dir()
    }

    fn data_dir(&self) -> Result<PathBuf> {
        self.inner.data_dir()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
