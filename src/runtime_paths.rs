// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::path::{Path, PathBuf};

/// Filesystem layout under the runtime root. All stores live in `state/`,
/// published page stubs in `pages/`.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub config_file: PathBuf,
    pub galleries_file: PathBuf,
    pub terms_file: PathBuf,
    pub media_file: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path) -> Self {
        let state_dir = root.join("state");
        Self {
            root: root.to_path_buf(),
            pages_dir: root.join("pages"),
            config_file: root.join("config.yaml"),
            galleries_file: state_dir.join("galleries.yaml"),
            terms_file: state_dir.join("terms.yaml"),
            media_file: state_dir.join("media.yaml"),
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.state_dir)?;
        std::fs::create_dir_all(&self.pages_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_hangs_off_the_root() {
        let paths = RuntimePaths::from_root(Path::new("/srv/galleries"));
        assert_eq!(paths.config_file, Path::new("/srv/galleries/config.yaml"));
        assert_eq!(
            paths.galleries_file,
            Path::new("/srv/galleries/state/galleries.yaml")
        );
        assert_eq!(paths.pages_dir, Path::new("/srv/galleries/pages"));
    }

    #[test]
    fn ensure_directories_creates_the_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = RuntimePaths::from_root(dir.path());
        paths.ensure_directories().expect("create dirs");
        assert!(paths.state_dir.is_dir());
        assert!(paths.pages_dir.is_dir());
    }
}
