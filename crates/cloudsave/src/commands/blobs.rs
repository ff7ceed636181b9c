//! Blob commands: `upload`, `list`, `download`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use super::connect;

/// Blob key used when `upload` is not given one: the file name.
pub fn default_key(path: &Path) -> Result<String> {
    match path.file_name() {
        Some(name) => Ok(name.to_string_lossy().into_owned()),
        None => bail!("cannot derive a key from '{}'; pass --key", path.display()),
    }
}

pub async fn upload(config_path: &str, path: &Path, key: Option<&str>) -> Result<()> {
    let key = match key {
        Some(k) => k.to_string(),
        None => default_key(path)?,
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading file: {}", path.display()))?;

    let cloud = connect(config_path).await?;
    cloud.upload_blob(&key, &bytes).await?;
    info!(key = %key, size = bytes.len(), "File uploaded");
    Ok(())
}

pub async fn list(config_path: &str) -> Result<()> {
    let cloud = connect(config_path).await?;
    for key in cloud.list_blobs().await? {
        println!("{}", key);
    }
    Ok(())
}

pub async fn download(config_path: &str, key: &str, out: Option<&Path>) -> Result<()> {
    let cloud = connect(config_path).await?;

    let keys = cloud.list_blobs().await?;
    debug!(count = keys.len(), keys = ?keys, "Stored blobs");

    let bytes = cloud.download_blob(key).await?;
    let out: PathBuf = match out {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_key(Path::new(key))?),
    };
    tokio::fs::write(&out, &bytes)
        .await
        .with_context(|| format!("writing file: {}", out.display()))?;

    info!(key, size = bytes.len(), path = %out.display(), "File downloaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_is_file_name() {
        assert_eq!(default_key(Path::new("/tmp/shots/screen.png")).unwrap(), "screen.png");
        assert!(default_key(Path::new("/")).is_err());
    }
}
