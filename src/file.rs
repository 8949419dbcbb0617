// src/file.rs

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::csv::write_row;

/// Create `dir` (and parents) unless it already exists as a directory.
pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("path exists but is not a directory: {}", dir.display()),
        ));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}

/// Whole file as text; `None` when it does not exist.
pub fn read_if_exists(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Append rows to `path`, creating it if needed. `header` is written first when
/// given. A file whose last line lacks a terminator gets one before our rows.
/// Everything goes through one buffer and is flushed once.
pub fn append_rows(
    path: &Path,
    header: Option<&[String]>,
    rows: &[Vec<String>],
    sep: char,
) -> io::Result<()> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new().create(true).read(true).append(true).open(path)?;
    let needs_newline = ends_without_newline(&mut file)?;

    let mut out = BufWriter::new(file);
    if needs_newline {
        writeln!(out)?;
    }
    if let Some(h) = header {
        write_row(&mut out, h, sep)?;
    }
    for row in rows {
        write_row(&mut out, row, sep)?;
    }
    out.flush()
}

/// Replace `path` with header + rows. Written to a sibling temp file first and
/// renamed over the destination, so readers never see a half-written file.
pub fn write_rows_atomic(
    path: &Path,
    header: &[String],
    rows: &[Vec<String>],
    sep: char,
) -> io::Result<()> {
    ensure_parent(path)?;
    let tmp = temp_sibling(path);
    let result = (|| -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&tmp)?);
        write_row(&mut out, header, sep)?;
        for row in rows {
            write_row(&mut out, row, sep)?;
        }
        out.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

fn ends_without_newline(file: &mut File) -> io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
