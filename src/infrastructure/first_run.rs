use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::types::GateState;
use crate::infrastructure::config::LauncherConfig;

/// Marker-file gate deciding whether the bootstrap path runs.
///
/// The marker's existence is the only signal. A query that finds no marker
/// claims it with an exclusive create, so among racing launchers exactly one
/// sees [`GateState::NotYetRun`].
#[derive(Clone, Debug)]
pub struct FirstRunGate {
    marker: PathBuf,
    legacy_marker: PathBuf,
}

impl FirstRunGate {
    pub fn new(marker: impl Into<PathBuf>, legacy_marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
            legacy_marker: legacy_marker.into(),
        }
    }

    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(&config.marker_path, &config.legacy_marker_path)
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    pub fn is_completed(&self) -> bool {
        self.marker.exists() || self.legacy_marker.exists()
    }

    pub fn query(&self) -> GateState {
        if self.is_completed() {
            tracing::info!(marker = %self.marker.display(), "bundle already initialized");
            return GateState::Completed;
        }

        match self.create_exclusive() {
            Ok(()) => {
                tracing::info!(
                    marker = %self.marker.display(),
                    "first run detected, marker claimed"
                );
                GateState::NotYetRun
            }
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {
                tracing::info!(
                    marker = %self.marker.display(),
                    "marker created by a concurrent launcher; treating bundle as initialized"
                );
                GateState::Completed
            }
            Err(error) => {
                tracing::warn!(
                    marker = %self.marker.display(),
                    error = %error,
                    "exclusive marker creation failed; falling back to plain write"
                );
                if let Err(fallback_error) = self.write_marker(b"") {
                    tracing::error!(
                        marker = %self.marker.display(),
                        error = %fallback_error,
                        "could not persist first-run marker; bootstrap will run anyway"
                    );
                }
                GateState::NotYetRun
            }
        }
    }

    /// Overwrite-safe completion write, independent of whether this process claimed the marker.
    pub fn mark_complete(&self) -> Result<()> {
        let stamp = format!("completed_at={}\n", Local::now().to_rfc3339());
        self.write_marker(stamp.as_bytes())
            .with_context(|| format!("failed to write marker: {}", self.marker.display()))?;
        tracing::info!(marker = %self.marker.display(), "bootstrap marked complete");
        Ok(())
    }

    /// Drops a claim taken by [`query`](Self::query) so the next run retries the bootstrap.
    pub fn release_claim(&self) -> Result<()> {
        match fs::remove_file(&self.marker) {
            Ok(()) => {
                tracing::info!(marker = %self.marker.display(), "released first-run marker");
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error)
                .with_context(|| format!("failed to remove marker: {}", self.marker.display())),
        }
    }

    fn create_exclusive(&self) -> std::io::Result<()> {
        if let Some(parent) = self.marker.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.marker)
            .map(|_| ())
    }

    fn write_marker(&self, content: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.marker.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.marker, content)
    }
}
