//! # Binary Provisioning
//!
//! Setup glue, not core behavior: make sure the droid binary exists before
//! the server starts accepting calls. The upstream installer script places
//! it under `~/.droid/bin`.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tracing::info;

/// Install location used by the factory.ai installer.
pub fn default_install_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".droid").join("bin").join("droid"))
}

/// Ensure the droid binary is installed, running the upstream installer if
/// it is missing. Returns the path that was verified or installed to.
pub async fn ensure_droid_installed() -> Result<PathBuf> {
    let binary_path = default_install_path().context("Could not determine home directory")?;

    if binary_path.exists() {
        info!(path = %binary_path.display(), "droid binary already installed");
        return Ok(binary_path);
    }

    let bin_dir = binary_path
        .parent()
        .context("Install path has no parent directory")?;

    info!("Downloading droid binary...");
    tokio::fs::create_dir_all(bin_dir)
        .await
        .context("Failed to create install directory")?;

    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg("curl -fsSL https://app.factory.ai/cli | sh")
        .current_dir(bin_dir)
        .status()
        .await
        .context("Failed to run droid installer")?;

    if !status.success() {
        bail!("droid installer exited with {}", status);
    }

    info!("droid binary downloaded successfully");
    Ok(binary_path)
}
