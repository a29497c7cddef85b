//! Filesystem checks for dataset paths, built on `cap-std` and `camino`.
//!
//! Every helper resolves the parent directory with ambient authority and
//! then operates on the final path component through that directory handle.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Directory that holds `path`; `.` for bare file names.
#[must_use]
pub fn parent_of(path: &Utf8Path) -> &Utf8Path {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}

/// Open the parent directory of `path` and return it with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} has no file name")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent_of(path), ambient_authority())?;
    Ok((dir, file_name))
}

/// Whether the directory that would contain `path` exists.
pub fn parent_dir_exists(path: &Utf8Path) -> io::Result<bool> {
    let (base, relative) = base_dir_and_relative(parent_of(path))?;
    if relative.as_str().is_empty() {
        return Ok(true);
    }
    Ok(base.is_dir(&relative))
}

/// Whether anything exists at `path`. A missing parent directory counts as
/// absent.
pub fn path_exists(path: &Utf8Path) -> io::Result<bool> {
    match open_dir_and_file(path) {
        Ok((dir, name)) => Ok(dir.exists(name.as_str())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Whether `path` exists and is a regular file. A missing parent directory
/// counts as absent.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match open_dir_and_file(path) {
        Ok(opened) => opened,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Remove the regular file at `path`.
pub fn remove_file(path: &Utf8Path) -> io::Result<()> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.remove_file(name.as_str())
}

/// Split a directory path into an ambient base directory and the path
/// relative to it.
///
/// Absolute paths are anchored at the filesystem root (or the Windows
/// drive/UNC prefix); relative paths at the current directory.
pub fn base_dir_and_relative(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();
    let base = match std_dir.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string())
        }
        Some(Component::RootDir) => Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string()),
        _ => Utf8PathBuf::from("."),
    };
    let relative = if base.as_str() == "." {
        dir.to_path_buf()
    } else {
        dir.strip_prefix(&base)
            .map_err(|_| io::Error::other(format!("failed to strip {base} from {dir}")))?
            .to_path_buf()
    };
    let handle = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((handle, relative))
}
