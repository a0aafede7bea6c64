// src/session.rs

//! Install workflow orchestration
//!
//! [`run`] drives the linear sequence: catalog -> platform probe -> selection
//! -> download -> install -> cleanup. All run-scoped state is threaded
//! through an explicit [`InstallSession`]; the downloaded archive and the
//! staging directory live inside a process-unique temp directory so
//! concurrent invocations cannot collide, and cleanup runs on success,
//! failure, and abort paths alike.

use crate::catalog::{CatalogClient, PackageDescriptor};
use crate::download::Downloader;
use crate::error::{Error, Result};
use crate::install::{self, DEFAULT_INSTALL_ROOT};
use crate::platform::{self, HostProfile};
use crate::prompt::Prompter;
use crate::select;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Workflow configuration, from the CLI
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Catalog root URL
    pub catalog_url: String,
    /// Preselected release version; skips the version prompt
    pub release: Option<String>,
    /// Preselected install root; skips the install path prompt
    pub install_path: Option<PathBuf>,
    /// Replace an existing installation without asking
    pub force: bool,
}

/// Run-scoped state threaded through the workflow steps
#[derive(Debug)]
pub struct InstallSession {
    pub host: HostProfile,
    pub version: String,
    pub package: PackageDescriptor,
    pub archive_path: PathBuf,
    pub staging_dir: PathBuf,
    pub install_root: Option<PathBuf>,
    pub target_path: Option<PathBuf>,
}

impl InstallSession {
    /// Create a session whose intermediate artifacts live under `work_dir`
    pub fn new(
        host: HostProfile,
        version: String,
        package: PackageDescriptor,
        work_dir: &Path,
    ) -> Self {
        let archive_path = work_dir.join(&package.name);
        let staging_dir = work_dir.join("stage");
        Self {
            host,
            version,
            package,
            archive_path,
            staging_dir,
            install_root: None,
            target_path: None,
        }
    }
}

/// Execute the whole install workflow
///
/// Returns the installed target path, or `None` when the user declined to
/// replace an existing installation.
pub fn run(options: &InstallOptions, prompter: &mut dyn Prompter) -> Result<Option<PathBuf>> {
    let catalog = CatalogClient::new(&options.catalog_url)?;
    let versions = catalog.list_versions()?;
    println!("Available versions: {}", versions.join(", "));

    let host = platform::probe()?;
    println!("Host platform: {}", host);

    let version = select::choose_version(prompter, &versions, options.release.as_deref())?;
    let packages = catalog.list_packages(&version)?;
    let candidates = select::filter_packages(&packages, &host);
    if candidates.is_empty() {
        return Err(Error::NoCompatiblePackage {
            version,
            host: host.to_string(),
        });
    }

    let package = if candidates.len() == 1 {
        println!("Only one compatible package: {}", candidates[0].name);
        candidates[0].clone()
    } else {
        let index = select::prompt_package(prompter, &candidates)?;
        candidates[index].clone()
    };

    let work_dir = tempfile::Builder::new().prefix("terark-get-").tempdir()?;

    let mut session = InstallSession::new(host, version, package, work_dir.path());
    info!(
        "Installing {} {} for {}",
        session.package.name, session.version, session.host
    );

    let outcome = download_and_install(&mut session, options, prompter);

    cleanup(&session);
    if let Err(e) = work_dir.close() {
        warn!("could not remove work directory: {}", e);
    }

    outcome
}

fn download_and_install(
    session: &mut InstallSession,
    options: &InstallOptions,
    prompter: &mut dyn Prompter,
) -> Result<Option<PathBuf>> {
    let downloader = Downloader::new()?;
    let bytes = downloader.fetch(&session.package.url, &session.archive_path)?;
    println!("Download finished ({} bytes)", bytes);

    perform_install(
        session,
        prompter,
        options.install_path.as_deref(),
        options.force,
    )
}

/// Install phase: stage, resolve the target, replace, commit, verify
///
/// Separated from [`run`] so the filesystem half of the workflow can be
/// exercised against a local archive without any network.
pub fn perform_install(
    session: &mut InstallSession,
    prompter: &mut dyn Prompter,
    install_path: Option<&Path>,
    force: bool,
) -> Result<Option<PathBuf>> {
    println!("Decompressing, this may take a few seconds...");
    install::stage(&session.archive_path, &session.staging_dir)?;

    let root = resolve_install_root(prompter, install_path)?;
    install::ensure_install_root(&root)?;
    session.install_root = Some(root.clone());

    let base = install::package_base_name(&session.package.name)?.to_string();
    let target = root.join(&base);

    if target.exists() && !force && !confirm_replacement(prompter, &target)? {
        println!("Keeping the existing installation at {}", target.display());
        return Ok(None);
    }

    install::replace_existing(&target)?;
    install::commit(&session.staging_dir, &base, &target)?;
    install::verify(&target, session.host.os)?;

    debug!("installed {} to {}", session.package.name, target.display());
    session.target_path = Some(target.clone());
    Ok(Some(target))
}

/// Prompt for an install root; empty input keeps the default
fn resolve_install_root(
    prompter: &mut dyn Prompter,
    preset: Option<&Path>,
) -> Result<PathBuf> {
    let root = match preset {
        Some(path) => path.to_path_buf(),
        None => {
            let input = prompter.ask(&format!(
                "Please enter an install path, leave empty for the default `{}`:\n",
                DEFAULT_INSTALL_ROOT
            ))?;
            PathBuf::from(input.trim())
        }
    };

    // the resolved install path is never empty
    if root.as_os_str().is_empty() {
        Ok(PathBuf::from(DEFAULT_INSTALL_ROOT))
    } else {
        Ok(root)
    }
}

/// Ask before destroying a previous installation
fn confirm_replacement(prompter: &mut dyn Prompter, target: &Path) -> Result<bool> {
    let answer = prompter.ask(&format!(
        "{} already exists and will be replaced. Continue? [y/N] ",
        target.display()
    ))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Remove the downloaded archive and the staging directory, best-effort
pub fn cleanup(session: &InstallSession) {
    if session.archive_path.exists() {
        if let Err(e) = fs::remove_file(&session.archive_path) {
            warn!(
                "could not remove downloaded archive {}: {}",
                session.archive_path.display(),
                e
            );
        }
    }
    if session.staging_dir.exists() {
        if let Err(e) = fs::remove_dir_all(&session.staging_dir) {
            warn!(
                "could not remove staging directory {}: {}",
                session.staging_dir.display(),
                e
            );
        }
    }
    debug!("cleaned up intermediate install state");
}
