//! CLI command implementations.

use std::path::Path;

use anyhow::{Context, Result};

use cloudsave::CloudSave;
use cloudsave::config::Config;

pub mod blobs;
pub mod records;

/// Load the config, build the façade and sign the player in.
pub async fn connect(config_path: &str) -> Result<CloudSave> {
    let config = Config::load(config_path)
        .await
        .with_context(|| format!("loading config: {}", config_path))?;
    let cloud = CloudSave::from_config(&config, Path::new(config_path))?;
    cloud.initialize().await?;
    Ok(cloud)
}

/// `cloudsave whoami` - sign in and print the player id.
pub async fn whoami(config_path: &str) -> Result<()> {
    let cloud = connect(config_path).await?;
    let session = cloud.session().await?;
    println!("{}", session.player_id());
    Ok(())
}
