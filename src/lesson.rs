//! A local lesson folder and the temporary zip archive built from it.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::contract::RemoteId;
use crate::error::SyncError;

/// Subdirectory of the system temp dir that holds archives while they are uploaded.
pub const ARCHIVE_DIR_NAME: &str = "lesson_sync";

/// One folder mapped to one remote lesson record.
///
/// The archive is owned by the lesson: it is created by [`Lesson::archive`],
/// removed by [`Lesson::delete_archive`], and removed on drop if still present.
#[derive(Debug)]
pub struct Lesson {
    source_path: PathBuf,
    display_name: String,
    remote_id: RemoteId,
    archive_path: Option<PathBuf>,
}

impl Lesson {
    pub fn new(source_path: impl Into<PathBuf>, remote_id: RemoteId) -> Result<Self, SyncError> {
        let source_path = source_path.into();
        if !source_path.is_dir() {
            return Err(SyncError::NotADirectory { path: source_path });
        }
        let display_name = last_segment(&source_path);
        Ok(Self {
            source_path,
            display_name,
            remote_id,
            archive_path: None,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn remote_id(&self) -> &RemoteId {
        &self.remote_id
    }

    pub fn archive_path(&self) -> Option<&Path> {
        self.archive_path.as_deref()
    }

    /// Zip the folder contents into the shared temp location.
    ///
    /// Compression runs on the blocking pool. If this future is dropped the
    /// writer stops at the next entry and removes its partial file.
    pub async fn archive(&mut self) -> Result<&Path, SyncError> {
        let dir = std::env::temp_dir().join(ARCHIVE_DIR_NAME);
        let (destination, file) = self.create_archive_file(&dir)?;

        let abort = AbortOnDrop::default();
        let stop = abort.0.clone();
        let source = self.source_path.clone();
        let target = destination.clone();
        let result = tokio::task::spawn_blocking(move || {
            let result = write_zip(&source, file, &stop);
            if result.is_err() {
                let _ = fs::remove_file(&target);
            }
            result
        })
        .await
        .unwrap_or_else(|e| Err(io::Error::new(io::ErrorKind::Other, e).into()));
        drop(abort);

        self.finish_archive(destination, result)
    }

    /// Zip the folder contents into `dir`, replacing any archive made earlier.
    ///
    /// Entry names are relative to the folder itself, so the zip root holds
    /// the folder's contents rather than the folder.
    pub fn archive_in(&mut self, dir: &Path) -> Result<&Path, SyncError> {
        let (destination, file) = self.create_archive_file(dir)?;
        let result = write_zip(&self.source_path, file, &AtomicBool::new(false));
        self.finish_archive(destination, result)
    }

    /// Create the empty archive file and take ownership of it, so that
    /// [`Lesson::delete_archive`] removes it even if writing never finishes.
    fn create_archive_file(&mut self, dir: &Path) -> Result<(PathBuf, File), SyncError> {
        self.delete_archive()?;
        fs::create_dir_all(dir)?;

        let destination = dir.join(format!(
            "{}-{}.zip",
            self.display_name,
            uuid::Uuid::new_v4().simple()
        ));
        debug!(
            source = %self.source_path.display(),
            archive = %destination.display(),
            "Writing archive"
        );
        let file = File::create(&destination)?;
        self.archive_path = Some(destination.clone());
        Ok((destination, file))
    }

    fn finish_archive(
        &mut self,
        destination: PathBuf,
        result: zip::result::ZipResult<()>,
    ) -> Result<&Path, SyncError> {
        if let Err(source) = result {
            // Never leave a half-written archive behind.
            if let Err(e) = self.delete_archive() {
                warn!(
                    archive = %destination.display(),
                    error = %e,
                    "Failed to remove partial archive"
                );
            }
            return Err(SyncError::Archive {
                path: self.source_path.clone(),
                source,
            });
        }

        info!(lesson = %self.display_name, archive = %destination.display(), "Archive created");
        Ok(self.archive_path.insert(destination).as_path())
    }

    /// Remove the archive from disk. Does nothing when there is none.
    pub fn delete_archive(&mut self) -> io::Result<()> {
        if let Some(path) = self.archive_path.take() {
            match fs::remove_file(&path) {
                Ok(()) => debug!(archive = %path.display(), "Archive deleted"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    self.archive_path = Some(path);
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

impl Drop for Lesson {
    fn drop(&mut self) {
        if let Err(e) = self.delete_archive() {
            warn!(lesson = %self.display_name, error = %e, "Failed to delete archive on drop");
        }
    }
}

fn last_segment(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            path.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| path.display().to_string())
}

/// Sets the shared flag when dropped, telling a detached writer to stop.
#[derive(Default)]
struct AbortOnDrop(Arc<AtomicBool>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Symlinks are followed: a linked file is stored with the target's bytes
/// under the link's own name, and a linked directory is walked like any other.
fn write_zip(source: &Path, file: File, stop: &AtomicBool) -> zip::result::ZipResult<()> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        if stop.load(Ordering::Relaxed) {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "archiving aborted").into());
        }
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut zip)?;
        } else {
            debug!(path = %entry.path().display(), "Skipping special file");
        }
    }

    zip.finish()?;
    Ok(())
}
