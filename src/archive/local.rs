use crate::archive::{ArchiveError, Archiver};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes raw page bodies to `<directory>/<YYYYMMDD-HHMM>/<name>.html`
///
/// The timestamp is fixed when the archiver is created, so one crawl run
/// archives into a single directory.
#[derive(Debug, Clone)]
pub struct LocalArchiver {
    run_dir: PathBuf,
}

impl LocalArchiver {
    pub fn new(directory: impl AsRef<Path>, started: DateTime<Local>) -> Self {
        let stamp = started.format("%Y%m%d-%H%M").to_string();
        Self {
            run_dir: directory.as_ref().join(stamp),
        }
    }

    pub fn with_current_time(directory: impl AsRef<Path>) -> Self {
        Self::new(directory, Local::now())
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Archive path for a URL: its last path segment, sanitized
    pub fn path_for(&self, url: &str) -> PathBuf {
        let segment = url.rsplit('/').next().unwrap_or_default();
        let mut name = sanitize_filename(segment);
        if name.is_empty() {
            name = "index".to_string();
        }
        self.run_dir.join(format!("{}.html", name))
    }
}

/// Replaces characters that are unsafe in file names with `_`
///
/// Covers `<>:"/\|?*` and ASCII control characters; surrounding whitespace is
/// trimmed.
///
/// # Examples
///
/// ```
/// use wiki_cartographer::archive::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Talk:Foo?bar"), "Talk_Foo_bar");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if (c as u32) < 0x20 => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[async_trait]
impl Archiver for LocalArchiver {
    fn name(&self) -> &str {
        "local"
    }

    async fn archive(&self, url: &str, body: &str) -> Result<(), ArchiveError> {
        tokio::fs::create_dir_all(&self.run_dir)
            .await
            .map_err(|source| ArchiveError::Io {
                path: self.run_dir.clone(),
                source,
            })?;

        let path = self.path_for(url);
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| ArchiveError::Io {
                path: path.clone(),
                source,
            })?;

        debug!("Saved {} to {}", url, path.display());
        Ok(())
    }
}
