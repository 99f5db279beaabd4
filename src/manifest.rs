//! Build-time asset manifest and preload-link rendering.
//!
//! The manifest maps a client module id (`src/views/BookView.vue`) to the
//! asset files it pulls in. Chunk files may themselves appear as keys, by
//! basename, listing their own dependencies.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::error::StartupError;

#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    entries: HashMap<String, Vec<String>>,
}

impl AssetManifest {
    /// An empty manifest renders no preload links.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(entries: HashMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    /// Read and parse the manifest. Failing here stops the process.
    pub async fn load(path: &Path) -> Result<Self, StartupError> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|source| StartupError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let entries: HashMap<String, Vec<String>> =
            serde_json::from_slice(&raw).map_err(|source| StartupError::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), modules = entries.len(), "Asset manifest loaded");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Link tags for every asset used by `modules`, each file once.
    ///
    /// A file's own dependencies (found under its basename) are linked
    /// before the file itself. Only one level of dependencies is followed.
    pub fn preload_links<S: AsRef<str>>(&self, modules: &[S]) -> String {
        let mut links = String::new();
        let mut seen = HashSet::new();

        for module in modules {
            let Some(files) = self.entries.get(module.as_ref()) else {
                continue;
            };
            for file in files {
                if !seen.insert(file.as_str()) {
                    continue;
                }
                if let Some(deps) = self.entries.get(basename(file)) {
                    for dep in deps {
                        if seen.insert(dep.as_str()) {
                            links.push_str(&preload_link(dep));
                        }
                    }
                }
                links.push_str(&preload_link(file));
            }
        }
        links
    }
}

fn basename(file: &str) -> &str {
    file.rsplit('/').next().unwrap_or(file)
}

/// Link tag for one asset, chosen by extension. Unknown types yield nothing.
fn preload_link(file: &str) -> String {
    let ext = Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext {
        "js" => format!(r#"<link rel="modulepreload" crossorigin href="{file}">"#),
        "css" | "scss" => format!(r#"<link rel="stylesheet" href="{file}">"#),
        "woff" | "woff2" => format!(
            r#"<link rel="preload" href="{file}" as="font" type="font/{ext}" crossorigin>"#
        ),
        "gif" | "png" => {
            format!(r#"<link rel="preload" href="{file}" as="image" type="image/{ext}">"#)
        }
        "jpg" | "jpeg" => {
            format!(r#"<link rel="preload" href="{file}" as="image" type="image/jpeg">"#)
        }
        _ => String::new(),
    }
}
