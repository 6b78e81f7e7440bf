//! Copy one working tree over another

use std::ffi::OsString;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::Path;

/// Name of the version-control metadata entry, never copied
pub const VCS_METADATA: &str = ".git";

/// What a sync copied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files: usize,
    pub directories: usize,
}

/// Names of the entries directly under `dir`, sorted
pub fn list_entries(dir: &Path) -> io::Result<Vec<OsString>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

/// Copy `src` to `dst`, replacing its bytes, permissions and timestamps
///
/// A directory sitting at `dst` is removed first.
pub fn copy_file_overwrite(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::symlink_metadata(dst).map(|m| m.is_dir()).unwrap_or(false) {
        fs::remove_dir_all(dst)?;
    }

    // fs::copy carries the permission bits over
    fs::copy(src, dst)?;

    let metadata = fs::metadata(src)?;
    let times = FileTimes::new()
        .set_accessed(metadata.accessed()?)
        .set_modified(metadata.modified()?);
    File::open(dst)?.set_times(times)?;
    Ok(())
}

/// Recreate the symlink `src` at `dst`, replacing whatever sits there
///
/// The link target is copied as is, never followed.
pub fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let link = fs::read_link(src)?;
    match fs::symlink_metadata(dst) {
        Ok(existing) if existing.is_symlink() && fs::read_link(dst)? == link => return Ok(()),
        Ok(existing) if existing.is_dir() => fs::remove_dir_all(dst)?,
        Ok(_) => fs::remove_file(dst)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    make_symlink(&link, src, dst)
}

#[cfg(unix)]
fn make_symlink(link: &Path, _src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, dst)
}

#[cfg(windows)]
fn make_symlink(link: &Path, src: &Path, dst: &Path) -> io::Result<()> {
    if fs::metadata(src).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(link, dst)
    } else {
        std::os::windows::fs::symlink_file(link, dst)
    }
}

/// Recursively merge `src` into `dst`
///
/// Entries only present in `dst` are left alone; on a name collision the
/// entry from `src` wins. `.git` entries are skipped at every depth.
pub fn copy_tree_merge(src: &Path, dst: &Path) -> io::Result<SyncReport> {
    // listed before `dst` exists, so a `dst` inside `src` is not copied into itself
    let names = list_entries(src)?;

    match fs::symlink_metadata(dst) {
        Ok(existing) if !existing.is_dir() => {
            fs::remove_file(dst)?;
            fs::create_dir(dst)?;
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dst)?,
        Err(e) => return Err(e),
    }

    let mut report = SyncReport {
        files: 0,
        directories: 1,
    };
    copy_entries(src, dst, names, &mut report)?;

    fs::set_permissions(dst, fs::metadata(src)?.permissions())?;
    Ok(report)
}

fn copy_entries(
    src: &Path,
    dst: &Path,
    names: Vec<OsString>,
    report: &mut SyncReport,
) -> io::Result<()> {
    for name in names {
        if name == VCS_METADATA {
            continue;
        }

        let from = src.join(&name);
        let to = dst.join(&name);
        let file_type = fs::symlink_metadata(&from)?.file_type();
        if file_type.is_symlink() {
            copy_symlink(&from, &to)?;
            report.files += 1;
        } else if file_type.is_dir() {
            let merged = copy_tree_merge(&from, &to)?;
            report.files += merged.files;
            report.directories += merged.directories;
        } else {
            copy_file_overwrite(&from, &to)?;
            report.files += 1;
        }
    }
    Ok(())
}

/// Copy every top-level entry of `source_root` except `.git` into `target_root`
pub fn sync_contents(source_root: &Path, target_root: &Path) -> io::Result<SyncReport> {
    log::debug!(
        "Copying {} over {}",
        source_root.display(),
        target_root.display()
    );

    let mut report = SyncReport::default();
    copy_entries(source_root, target_root, list_entries(source_root)?, &mut report)?;

    log::info!(
        "Copied {} files in {} directories into {}",
        report.files,
        report.directories,
        target_root.display()
    );
    Ok(report)
}
