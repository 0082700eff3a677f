// src/config.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// route-table.toml の内容。すべてのキーは省略可能
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ブラウザタブのタイトルに付ける接尾辞
    pub base_title: String,

    /// ログイン画面のルート名
    pub login_name: String,

    /// ホーム画面のルート名
    pub home_name: String,

    /// モジュール指定子のエイリアス (例: "@" → "src")
    pub aliases: BTreeMap<String, String>,

    /// 拡張子なしで書かれたコンポーネントを探すときに試す拡張子
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_title: "Creator".to_string(),
            login_name: "login".to_string(),
            home_name: "home".to_string(),
            aliases: BTreeMap::from([("@".to_string(), "src".to_string())]),
            extensions: ["vue", "js", "ts", "jsx", "tsx"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    /// TOML ファイルから読み込む
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = Config::from_toml("base_title = \"Admin\"").unwrap();
        assert_eq!(config.base_title, "Admin");
        assert_eq!(config.login_name, "login");
        assert_eq!(config.aliases.get("@").map(String::as_str), Some("src"));
        assert!(config.extensions.iter().any(|e| e == "vue"));
    }

    #[test]
    fn aliases_table_replaces_default() {
        let config = Config::from_toml(
            r#"
            extensions = ["vue"]

            [aliases]
            "~" = "app"
            "#,
        )
        .unwrap();
        assert_eq!(config.aliases.len(), 1);
        assert_eq!(config.aliases["~"], "app");
        assert_eq!(config.extensions, ["vue"]);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        assert!(matches!(
            Config::from_toml("base_title = "),
            Err(Error::Config(_))
        ));
    }
}
