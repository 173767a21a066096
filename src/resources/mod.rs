//! Loading of external files. The viewer reads exactly one: the diffuse texture.

use std::path::Path;

use anyhow::Context as _;

pub mod texture;

/// Reads a file relative to the working directory.
pub async fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    log::debug!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let err = load_binary(Path::new("definitely/not/here.jpg"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("definitely/not/here.jpg"));
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let data = load_binary(Path::new("Cargo.toml")).await.unwrap();
        assert!(!data.is_empty());
    }
}
