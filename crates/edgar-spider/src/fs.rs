use crate::config::Naming;
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};
use uuid::Uuid;

const KEY_LEN: usize = 5;

/// Chooses the short identifier that keeps output file names apart.
///
/// One `FileNamer` is created per pipeline run, so with [`Naming::Slug`] every file a run
/// writes shares the run's identifier.
#[derive(Clone, Debug)]
pub struct FileNamer {
    naming: Naming,
    run_id: String,
}

impl FileNamer {
    pub fn new(naming: Naming) -> Self {
        Self {
            naming,
            run_id: short_id(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn key(&self, contents: &[u8]) -> String {
        match self.naming {
            Naming::Slug => self.run_id.clone(),
            Naming::ContentHash => content_key(contents),
        }
    }

    // identical bytes under a content-derived name are the same file
    fn reuse_identical(&self) -> bool {
        self.naming == Naming::ContentHash
    }

    /// Write `contents` to the first of `names` that is free inside `folder`.
    ///
    /// Existing files are never overwritten. With [`Naming::ContentHash`], a taken name whose
    /// file already holds identical bytes is returned as is.
    pub async fn save(&self, folder: &Path, names: &[String], contents: &[u8]) -> Result<PathBuf> {
        trace!("checking directory path: {:?}", folder);
        tokio::fs::create_dir_all(folder).await?;

        for name in names {
            let path = folder.join(name);
            if write_new(&path, contents).await? {
                debug!("wrote {} bytes to {:?}", contents.len(), path);
                return Ok(path);
            }
            if self.reuse_identical() && tokio::fs::read(&path).await? == contents {
                debug!("{:?} already holds identical content", path);
                return Ok(path);
            }
            trace!("{:?} is taken", path);
        }

        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("every candidate file name is taken in {:?}: {names:?}", folder),
        )
        .into())
    }
}

/// A short random identifier, e.g. `"3f9a1"`.
pub fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(KEY_LEN);
    id
}

/// The leading hex characters of the SHA-256 of `contents`.
pub fn content_key(contents: &[u8]) -> String {
    let mut key = hex::encode(Sha256::digest(contents));
    key.truncate(KEY_LEN);
    key
}

/// Whitespace becomes `_`; path separators too, so a title cannot escape the folder.
pub fn file_safe(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

// Ok(false) when the path already exists.
async fn write_new(path: &Path, contents: &[u8]) -> Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    file.write_all(contents).await?;
    file.flush().await?;
    Ok(true)
}
