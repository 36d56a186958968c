use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::traits::PathProvisioner;

/// Creates dependency paths as directories under a local root.
///
/// `hdfs://nn:8020/data/in/2013` and `/data/in/2013` both land in
/// `<root>/data/in/2013`.
#[derive(Clone, Debug)]
pub struct FsProvisioner {
    pub root: PathBuf,
}

impl FsProvisioner {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn local_path(&self, path: &str) -> Result<PathBuf> {
        let stripped = strip_scheme_and_authority(path.trim());
        let mut out = self.root.clone();
        for component in Path::new(stripped).components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(anyhow!("refusing to provision path outside root: {path}"));
                }
            }
        }
        Ok(out)
    }
}

fn strip_scheme_and_authority(path: &str) -> &str {
    match path.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
        None => path,
    }
}

impl PathProvisioner for FsProvisioner {
    fn create_paths(&self, paths: &[String]) -> Result<()> {
        for path in paths.iter().filter(|p| !p.trim().is_empty()) {
            let dir = self.local_path(path)?;
            std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
            info!(path = %path, local = %dir.display(), "created dependency path");
        }
        Ok(())
    }
}

/// Remembers every requested path. For tests.
#[derive(Default)]
pub struct RecordingProvisioner {
    created: Mutex<Vec<String>>,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PathProvisioner for RecordingProvisioner {
    fn create_paths(&self, paths: &[String]) -> Result<()> {
        self.created.lock().unwrap_or_else(|e| e.into_inner()).extend(paths.iter().cloned());
        Ok(())
    }
}
