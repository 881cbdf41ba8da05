use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:1080".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: default_bind(),
        }
    }
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let s = tokio::fs::read(path).await.context("read file")?;
        let s = String::from_utf8(s).context("parse utf8")?;
        serde_yaml_ng::from_str(&s).context("parse yaml")
    }
}
