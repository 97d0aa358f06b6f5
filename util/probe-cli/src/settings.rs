use std::path::PathBuf;

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::fs::{create_dir_all, read_to_string, write};

pub struct FileBackedValue<T> {
    value: T,
    path: PathBuf,
}
impl<T: Serialize + DeserializeOwned> FileBackedValue<T> {
    pub async fn new(path: PathBuf, default: impl FnOnce() -> T) -> anyhow::Result<FileBackedValue<T>> {
        let value = if path.exists() {
            let text = read_to_string(&path).await.with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        } else {
            if let Some(parent) = path.parent() {
                create_dir_all(parent).await?;
            }
            default()
        };
        Ok(FileBackedValue { value, path })
    }
    pub fn get(&self) -> &T {
        &self.value
    }
    pub async fn mutate<R>(&mut self, f: impl FnOnce(&mut T) -> anyhow::Result<R>) -> anyhow::Result<R> {
        let result = f(&mut self.value)?;
        write(&self.path, serde_json::to_string_pretty(&self.value)?)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(result)
    }
    pub async fn set(&mut self, value: T) -> anyhow::Result<()> {
        self.mutate(|inner| {
            *inner = value;
            Ok(())
        })
        .await
    }
}

/// `base` with the fields present in the JSON object `overrides` replaced.
pub fn merge_json<T: Serialize + DeserializeOwned>(base: &T, overrides: &str) -> anyhow::Result<T> {
    let mut merged = serde_json::to_value(base)?;
    let overrides: Value = serde_json::from_str(overrides).context("parameters are not valid JSON")?;
    match (&mut merged, overrides) {
        (Value::Object(fields), Value::Object(changes)) => fields.extend(changes),
        _ => anyhow::bail!("parameters must be a JSON object"),
    }
    Ok(serde_json::from_value(merged)?)
}

#[cfg(test)]
pub mod test {
    use probe_routines::ProbeParameters;
    use tempdir::TempDir;

    use super::*;

    #[tokio::test]
    pub async fn test_settings_persist() {
        let dir = TempDir::new("probe-settings").unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = FileBackedValue::new(path.clone(), ProbeParameters::default).await.unwrap();
        assert_eq!(settings.get(), &ProbeParameters::default());
        settings.set(ProbeParameters { probe_diam: 3.0, ..Default::default() }).await.unwrap();

        let reloaded: FileBackedValue<ProbeParameters> = FileBackedValue::new(path, || unreachable!()).await.unwrap();
        assert_eq!(reloaded.get().probe_diam, 3.0);
    }

    #[test]
    pub fn test_merge_overrides_fields() {
        let base = ProbeParameters { probe_diam: 2.0, max_travel: 20.0, ..Default::default() };
        let merged = merge_json(&base, r#"{"max_travel": 30, "ts_x": 5}"#).unwrap();
        assert_eq!(merged.probe_diam, 2.0);
        assert_eq!(merged.max_travel, 30.0);
        assert_eq!(merged.ts_x, Some(5.0));
        assert!(merge_json(&base, "[1]").is_err());
        assert!(merge_json(&base, r#"{"max_travel": "far"}"#).is_err());
    }
}
