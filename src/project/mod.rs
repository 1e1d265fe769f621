// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Output directory layout.
//!
//! `{base}/{name}/` holds the stems of a single pattern, Project mode adds
//! one numbered subdirectory per pattern. Nothing here ever deletes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("invalid project name '{0}'")]
    InvalidName(String),
    #[error("{0} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DirectoryError {
    /// Status text for a project directory failure
    pub fn project_status(&self) -> &'static str {
        "Directory Error. Please enter different Name."
    }

    /// Status text for a pattern directory failure
    pub fn pattern_status(&self) -> &'static str {
        "Directory Error"
    }
}

fn ensure_dir(path: &Path) -> Result<(), DirectoryError> {
    if path.exists() && !path.is_dir() {
        return Err(DirectoryError::NotADirectory(path.to_path_buf()));
    }
    fs::create_dir_all(path).map_err(|source| DirectoryError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "directory ready");
    Ok(())
}

/// Create `{base}/{name}` if needed and return it
pub fn ensure_project_dir(base: &Path, name: &str) -> Result<PathBuf, DirectoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
    {
        return Err(DirectoryError::InvalidName(name.to_string()));
    }

    let path = base.join(trimmed);
    ensure_dir(&path)?;
    Ok(path)
}

/// Create `{project}/{pattern_index}` if needed and return it
pub fn ensure_pattern_dir(project: &Path, pattern_index: u8) -> Result<PathBuf, DirectoryError> {
    let path = pattern_dir(project, pattern_index);
    ensure_dir(&path)?;
    Ok(path)
}

/// Directory of one pattern inside a project
pub fn pattern_dir(project: &Path, pattern_index: u8) -> PathBuf {
    project.join(pattern_index.to_string())
}

/// Stem file name for a zero-based track counter
pub fn track_file_name(name: &str, track_counter: u8) -> String {
    format!("{}_track{}.wav", name, track_counter + 1)
}
