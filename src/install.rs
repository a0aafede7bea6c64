// src/install.rs

//! Archive staging and installation
//!
//! The install sequence is linear: extract the archive into a staging
//! directory, prepare the install root, destructively replace any previous
//! installation at the target path, move the staged payload into place, and
//! verify the result. Archives are gzip-compressed tars whose payload is a
//! single `pkg/<base>` directory.

use crate::error::{Error, Result};
use crate::platform::OsFamily;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tar::Archive;
use tracing::{debug, info};

/// Platform-conventional default install root
pub const DEFAULT_INSTALL_ROOT: &str = "/usr/local";

/// Strip the archive suffix from a package file name
///
/// Only gzip-compressed tars are supported; any other extension is an
/// [`Error::UnsupportedFormat`].
pub fn package_base_name(file_name: &str) -> Result<&str> {
    file_name
        .strip_suffix(".tar.gz")
        .or_else(|| file_name.strip_suffix(".tgz"))
        .ok_or_else(|| Error::UnsupportedFormat(file_name.to_string()))
}

/// Extract `archive` into a fresh staging directory
///
/// Any existing directory at `staging` is removed first.
pub fn stage(archive: &Path, staging: &Path) -> Result<()> {
    let file_name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::UnsupportedFormat(archive.display().to_string()))?;
    package_base_name(file_name)?;

    if staging.exists() {
        fs::remove_dir_all(staging)?;
    }
    fs::create_dir_all(staging)?;

    info!("Extracting {} into {}", archive.display(), staging.display());
    let file = File::open(archive)?;
    let mut tarball = Archive::new(GzDecoder::new(file));
    tarball.unpack(staging)?;
    Ok(())
}

/// Create the install root if absent
pub fn ensure_install_root(root: &Path) -> Result<()> {
    fs::create_dir_all(root).map_err(|e| Error::InstallPathError {
        path: root.display().to_string(),
        reason: e.to_string(),
    })
}

/// Remove a previous installation at `target`, if any
///
/// Destructive by contract: no backup is taken.
pub fn replace_existing(target: &Path) -> Result<()> {
    if target.is_dir() {
        info!("Removing previous installation at {}", target.display());
        fs::remove_dir_all(target)?;
    } else if target.exists() {
        fs::remove_file(target)?;
    }
    Ok(())
}

/// Move the staged `pkg/<base>` payload to `target`
pub fn commit(staging: &Path, base: &str, target: &Path) -> Result<()> {
    let source = staging.join("pkg").join(base);
    if !source.is_dir() {
        return Err(Error::UnsupportedFormat(format!(
            "archive does not contain the expected pkg/{} directory",
            base
        )));
    }

    debug!("Moving {} to {}", source.display(), target.display());
    if fs::rename(&source, target).is_err() {
        // staging usually lives on a different filesystem than the install
        // root, where rename fails with EXDEV
        copy_dir_all(&source, target)?;
        fs::remove_dir_all(&source)?;
    }
    Ok(())
}

/// Confirm the payload landed and print the layout and environment hints
pub fn verify(target: &Path, os: OsFamily) -> Result<()> {
    if !target.is_dir() {
        return Err(Error::VerificationFailure(format!(
            "{} is missing after the install",
            target.display()
        )));
    }

    let target = target.display();
    println!();
    println!("TerarkDB is installed successfully:");
    println!();
    println!("  {}/", target);
    println!("      api/        Third-party APIs, e.g. the LevelDB API");
    println!("      include/    TerarkDB native headers");
    println!("      lib/        Libraries");
    println!("      bin/        Tools, e.g. the schema to C++ struct converter");
    println!();
    println!("Don't forget to set up your environment variables:");
    println!();
    println!("  export PATH=$PATH:{}/bin", target);
    match os {
        OsFamily::Linux => println!("  export LD_LIBRARY_PATH={}/lib", target),
        OsFamily::Darwin => println!("  export DYLD_LIBRARY_PATH={}/lib", target),
    }
    println!();
    Ok(())
}

/// Recursive copy preserving directory structure and symlinks
fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let to = dst.join(entry.file_name());
        if file_type.is_dir() {
            copy_dir_all(&entry.path(), &to)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            std::os::unix::fs::symlink(link, &to)?;
        } else {
            fs::copy(entry.path(), &to)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::path::PathBuf;

    /// Build a `<base>.tgz` containing `pkg/<base>/{api,include,lib,bin}`
    fn make_package_archive(dir: &Path, base: &str) -> PathBuf {
        let payload = dir.join("payload").join("pkg").join(base);
        for sub in ["api", "include", "lib", "bin"] {
            fs::create_dir_all(payload.join(sub)).unwrap();
        }
        fs::write(payload.join("bin").join("terark-tool"), b"#!/bin/sh\n").unwrap();
        fs::write(payload.join("lib").join("libterark.so"), b"\x7fELF").unwrap();

        let archive_path = dir.join(format!("{}.tgz", base));
        let file = File::create(&archive_path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder
            .append_dir_all(format!("pkg/{}", base), &payload)
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        archive_path
    }

    #[test]
    fn test_package_base_name_accepts_tgz_and_tar_gz() {
        assert_eq!(
            package_base_name("terarkdb-0.13.8-linux.tgz").unwrap(),
            "terarkdb-0.13.8-linux"
        );
        assert_eq!(
            package_base_name("terarkdb-0.13.8-linux.tar.gz").unwrap(),
            "terarkdb-0.13.8-linux"
        );
    }

    #[test]
    fn test_package_base_name_rejects_other_formats() {
        let result = package_base_name("terarkdb-0.13.8-linux.zip");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_stage_rejects_unsupported_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("package.zip");
        fs::write(&archive, b"not a tarball").unwrap();

        let result = stage(&archive, &dir.path().join("stage"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_stage_extracts_payload() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_package_archive(dir.path(), "terarkdb-1.2.3-linux");
        let staging = dir.path().join("stage");

        stage(&archive, &staging).unwrap();
        assert!(staging.join("pkg/terarkdb-1.2.3-linux/bin/terark-tool").exists());
    }

    #[test]
    fn test_stage_replaces_stale_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_package_archive(dir.path(), "terarkdb-1.2.3-linux");
        let staging = dir.path().join("stage");
        fs::create_dir_all(staging.join("leftover")).unwrap();

        stage(&archive, &staging).unwrap();
        assert!(!staging.join("leftover").exists());
        assert!(staging.join("pkg/terarkdb-1.2.3-linux").is_dir());
    }

    #[test]
    fn test_commit_moves_payload_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_package_archive(dir.path(), "terarkdb-1.2.3-linux");
        let staging = dir.path().join("stage");
        stage(&archive, &staging).unwrap();

        let root = dir.path().join("opt");
        ensure_install_root(&root).unwrap();
        let target = root.join("terarkdb-1.2.3-linux");
        commit(&staging, "terarkdb-1.2.3-linux", &target).unwrap();

        assert!(target.join("bin/terark-tool").exists());
        assert!(!staging.join("pkg/terarkdb-1.2.3-linux").exists());
    }

    #[test]
    fn test_commit_requires_pkg_directory() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("stage");
        fs::create_dir_all(&staging).unwrap();

        let result = commit(&staging, "missing", &dir.path().join("target"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_replace_existing_is_destructive() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("terarkdb-1.2.3-linux");
        fs::create_dir_all(target.join("lib")).unwrap();
        fs::write(target.join("lib/stale.so"), b"old").unwrap();

        replace_existing(&target).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_previous_install_contents_are_gone_after_reinstall() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_package_archive(dir.path(), "terarkdb-1.2.3-linux");
        let staging = dir.path().join("stage");
        stage(&archive, &staging).unwrap();

        let root = dir.path().join("opt");
        let target = root.join("terarkdb-1.2.3-linux");
        fs::create_dir_all(target.join("leftover")).unwrap();
        fs::write(target.join("leftover/marker"), b"prior install").unwrap();

        ensure_install_root(&root).unwrap();
        replace_existing(&target).unwrap();
        commit(&staging, "terarkdb-1.2.3-linux", &target).unwrap();

        assert!(!target.join("leftover").exists());
        assert!(target.join("bin/terark-tool").exists());
    }

    #[test]
    fn test_ensure_install_root_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("deep/nested/root");
        ensure_install_root(&root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_ensure_install_root_reports_unusable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();

        let result = ensure_install_root(&blocker.join("sub"));
        assert!(matches!(result, Err(Error::InstallPathError { .. })));
    }

    #[test]
    fn test_verify_fails_when_target_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify(&dir.path().join("absent"), OsFamily::Linux);
        assert!(matches!(result, Err(Error::VerificationFailure(_))));
    }

    #[test]
    fn test_verify_accepts_installed_target() {
        let dir = tempfile::tempdir().unwrap();
        verify(dir.path(), OsFamily::Darwin).unwrap();
    }
}
