//! engine::input
//!
//! Reading witnesses from plain-text files.
//!
//! A witness file holds the whole text of one witness. Its sigil is the
//! file stem unless the caller supplies one. A collation directory holds one
//! `*.txt` file per witness; files are merged in name order.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::CollationJob;
use crate::core::types::{Sigil, TypeError, Witness};

/// File extension of witness files in a collation directory.
pub const WITNESS_EXTENSION: &str = "txt";

/// Errors from reading witness input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot derive a sigil from '{path}': {source}")]
    Sigil { path: PathBuf, source: TypeError },

    #[error("no witness files (*.{ext}) in '{dir}'", ext = WITNESS_EXTENSION)]
    NoWitnesses { dir: PathBuf },

    #[error("{given} sigils given for {files} files")]
    SigilCount { given: usize, files: usize },
}

/// Sigil derived from a file name: its stem.
pub fn sigil_for_path(path: &Path) -> Result<Sigil, InputError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Sigil::new(stem).map_err(|source| InputError::Sigil {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and tokenize one witness file.
pub fn read_witness(path: &Path, sigil: Sigil) -> Result<Witness, InputError> {
    let text = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Witness::from_text(sigil, &text))
}

/// Build a job from explicit files, with optional sigils in the same order.
pub fn job_from_files(
    name: impl Into<String>,
    paths: &[PathBuf],
    sigils: &[Sigil],
) -> Result<CollationJob, InputError> {
    if !sigils.is_empty() && sigils.len() != paths.len() {
        return Err(InputError::SigilCount {
            given: sigils.len(),
            files: paths.len(),
        });
    }

    let witnesses = paths
        .iter()
        .enumerate()
        .map(|(idx, path)| {
            let sigil = match sigils.get(idx) {
                Some(sigil) => sigil.clone(),
                None => sigil_for_path(path)?,
            };
            read_witness(path, sigil)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CollationJob {
        name: name.into(),
        witnesses,
    })
}

/// Build a job from the `*.txt` files of `dir`, in name order.
pub fn job_from_dir(dir: &Path) -> Result<CollationJob, InputError> {
    let entries = fs::read_dir(dir).map_err(|source| InputError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| InputError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == WITNESS_EXTENSION) {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(InputError::NoWitnesses {
            dir: dir.to_path_buf(),
        });
    }
    paths.sort();

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    job_from_files(name, &paths, &[])
}
