// src/download.rs

//! Package downloading
//!
//! Streams the selected archive to disk in fixed-size chunks with a
//! cumulative byte progress line. Each attempt writes to `<dest>.part` and
//! renames into place on completion, so a failed transfer never leaves a
//! half-written archive at the destination path.

use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Connect timeout; the request itself is unbounded so large archives are
/// not cut off mid-body
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed downloads
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Read chunk size for the streaming copy
const CHUNK_SIZE: usize = 8 * 1024;

/// Streaming HTTP downloader with retry support
pub struct Downloader {
    client: Client,
    max_retries: u32,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None)
            .build()
            .map_err(|e| Error::DownloadError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Download `url` to `dest`, returning the number of bytes written
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {} to {}", url, dest.display());

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(url, dest) {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(e);
                    }
                    warn!("download attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }

    /// One transfer attempt; the partial file is removed on any failure
    fn attempt(&self, url: &str, dest: &Path) -> Result<u64> {
        let part_path = dest.with_extension("part");
        match self.stream_to(url, &part_path) {
            Ok(bytes) => {
                fs::rename(&part_path, dest)?;
                Ok(bytes)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&part_path) {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("could not remove partial download {}: {}", part_path.display(), rm);
                    }
                }
                Err(e)
            }
        }
    }

    fn stream_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let progress = progress_bar(response.content_length());
        let mut file = File::create(dest)?;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut written: u64 = 0;

        loop {
            let read = response
                .read(&mut buf)
                .map_err(|e| Error::DownloadError(format!("transfer from {} failed: {}", url, e)))?;
            if read == 0 {
                break;
            }
            file.write_all(&buf[..read])?;
            written += read as u64;
            progress.inc(read as u64);
        }

        file.flush()?;
        progress.finish_and_clear();
        Ok(written)
    }
}

fn progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "Downloading {bytes:>10} / {total_bytes} [{wide_bar}] {bytes_per_sec}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("Downloading {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        }
    }
}
