use crate::error::DocsortError;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Highest `_n` suffix tried before giving up on a name.
pub const MAX_SUFFIX: u32 = 10_000;

/// Move `source` into `target_dir` without ever overwriting an existing file.
///
/// When the file name is taken, `_1`, `_2`, ... is inserted before the
/// extension. The name is reserved with an exclusive create before the move,
/// so a concurrent writer cannot claim it in between. Returns the final path.
pub fn relocate(source: &Path, target_dir: &Path) -> Result<PathBuf, DocsortError> {
    let file_name = source.file_name().ok_or_else(|| DocsortError::FileSystem {
        path: source.to_path_buf(),
        reason: "source has no file name".into(),
    })?;

    fs::create_dir_all(target_dir).map_err(|e| DocsortError::fs(target_dir, e))?;

    let destination = reserve_destination(target_dir, Path::new(file_name), MAX_SUFFIX)?;
    if let Err(e) = move_file(source, &destination) {
        // Drop the empty placeholder; the source is untouched.
        let _ = fs::remove_file(&destination);
        return Err(DocsortError::fs(&destination, e));
    }

    tracing::debug!(
        from = %source.display(),
        to = %destination.display(),
        "relocated file"
    );
    Ok(destination)
}

/// Candidate name for attempt `n`: the original name, then `stem_n.ext`.
pub fn suffixed_name(file_name: &Path, n: u32) -> OsString {
    if n == 0 {
        return file_name.as_os_str().to_os_string();
    }

    let stem = file_name.file_stem().unwrap_or(file_name.as_os_str());
    let mut name = stem.to_os_string();
    name.push(format!("_{n}"));
    if let Some(ext) = file_name.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

fn reserve_destination(
    target_dir: &Path,
    file_name: &Path,
    max_suffix: u32,
) -> Result<PathBuf, DocsortError> {
    for n in 0..=max_suffix {
        let candidate = target_dir.join(suffixed_name(file_name, n));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(DocsortError::fs(&candidate, e)),
        }
    }

    Err(DocsortError::FileSystem {
        path: target_dir.join(file_name),
        reason: format!("no free name after {max_suffix} suffixes"),
    })
}

/// Rename, falling back to copy + delete across filesystems.
fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    fs::copy(source, destination)?;
    fs::remove_file(source)
}
