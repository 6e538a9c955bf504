//! Last-resort engine download.
//!
//! Fetches a platform zip archive and extracts the engine binaries (and the
//! prober, when present) into a scratch directory.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use cf_core::Error;

/// Download the archive at `url` and extract every file named like a
/// `bin/ffmpeg*` or `bin/ffprobe*` entry into `dest`. Returns the path of
/// `binary_name`.
///
/// # Errors
///
/// Any network, archive, or filesystem failure, or an archive without
/// `binary_name`, is reported as [`Error::BackendUnavailable`].
pub async fn fetch_engine(url: &str, dest: &Path, binary_name: &str) -> cf_core::Result<PathBuf> {
    tracing::info!(%url, dest = %dest.display(), "downloading media engine");

    let unavailable = |what: &str, e: &dyn std::fmt::Display| {
        Error::BackendUnavailable(format!("engine download {what} failed: {e}"))
    };

    let response = reqwest::get(url)
        .await
        .map_err(|e| unavailable("request", &e))?;
    if !response.status().is_success() {
        return Err(unavailable("request", &response.status()));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| unavailable("body", &e))?;

    let dest = dest.to_path_buf();
    let binary_name = binary_name.to_string();
    tokio::task::spawn_blocking(move || extract(&bytes, &dest, &binary_name))
        .await
        .map_err(|e| Error::Internal(format!("extract task panicked: {e}")))?
}

fn extract(archive: &[u8], dest: &Path, binary_name: &str) -> cf_core::Result<PathBuf> {
    let fail = |e: &dyn std::fmt::Display| {
        Error::BackendUnavailable(format!("engine archive extraction failed: {e}"))
    };

    std::fs::create_dir_all(dest).map_err(|e| fail(&e))?;
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(|e| fail(&e))?;

    let mut found = None;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| fail(&e))?;
        if entry.is_dir() {
            continue;
        }
        let Some(file_name) = Path::new(entry.name())
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
        else {
            continue;
        };
        if !(file_name.starts_with("ffmpeg") || file_name.starts_with("ffprobe")) {
            continue;
        }

        let target = dest.join(&file_name);
        let mut out = std::fs::File::create(&target).map_err(|e| fail(&e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| fail(&e))?;
        make_executable(&target).map_err(|e| fail(&e))?;
        tracing::debug!(entry = %file_name, "extracted");

        if file_name == binary_name {
            found = Some(target);
        }
    }

    found.ok_or_else(|| {
        Error::BackendUnavailable(format!("engine archive does not contain {binary_name}"))
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
