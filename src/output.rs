//! Output layout: where each tarball goes, and the output directory itself.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, TarballError};

/// Destination archive for `source` inside `output_dir`.
///
/// With `tarball_filename` set every source maps to the same path.
pub fn resolve(config: &Config, output_dir: &Path, source: &Path) -> PathBuf {
    let mut name = match &config.tarball_filename {
        Some(fixed) => OsString::from(fixed),
        None => source
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("disk")),
    };
    name.push(&config.tarball_extension);
    output_dir.join(name)
}

/// Create `path`, refusing to reuse one left by an earlier run.
pub fn establish_output_dir(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(TarballError::OutputExists(path.to_path_buf()));
    }
    fs::create_dir_all(path).map_err(|source| TarballError::CreateOutputDir {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use tempfile::TempDir;

    fn config(raw: RawConfig) -> Config {
        let locator = |name: &str| -> std::result::Result<PathBuf, String> {
            Ok(PathBuf::from("/usr/bin").join(name))
        };
        Config::resolve(raw, &locator).unwrap()
    }

    #[test]
    fn test_derives_name_from_source() {
        let config = config(RawConfig::default());
        let out = resolve(&config, Path::new("/out"), Path::new("/build/qemu/disk.img"));
        assert_eq!(out, PathBuf::from("/out/disk.img.tar.gz"));
    }

    #[test]
    fn test_fixed_filename_ignores_source() {
        let config = config(RawConfig {
            tarball_filename: Some("rootfs".into()),
            tarball_extension: Some(".tgz".into()),
            ..Default::default()
        });
        let a = resolve(&config, Path::new("out"), Path::new("a.qcow2"));
        let b = resolve(&config, Path::new("out"), Path::new("b.qcow2"));
        assert_eq!(a, PathBuf::from("out/rootfs.tgz"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let config = config(RawConfig::default());
        let first = resolve(&config, Path::new("out"), Path::new("img/disk.raw"));
        for _ in 0..5 {
            assert_eq!(resolve(&config, Path::new("out"), Path::new("img/disk.raw")), first);
        }
    }

    #[test]
    fn test_establish_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested/output");

        establish_output_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_establish_refuses_existing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("output");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("keep.txt"), b"previous run").unwrap();

        let err = establish_output_dir(&dir).unwrap_err();
        assert!(matches!(err, TarballError::OutputExists(_)));
        assert_eq!(fs::read(dir.join("keep.txt")).unwrap(), b"previous run");
    }
}
