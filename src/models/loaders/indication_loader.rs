use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tokio::fs;

use crate::error::{AppError, AppResult, FileError};

/// 内置适应症目录
const BUILTIN_CATALOG: &str = include_str!("../../../assets/indications.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    sets: BTreeMap<String, Vec<String>>,
}

/// 解析适应症目录 TOML 文本
pub fn parse_indication_catalog(content: &str) -> AppResult<BTreeMap<String, Vec<String>>> {
    let file: CatalogFile = toml::from_str(content)?;
    Ok(file.sets)
}

/// 加载适应症目录
///
/// 未指定路径时使用内置目录；指定了路径则从文件读取。
pub async fn load_indication_catalog(
    path: Option<&Path>,
) -> AppResult<BTreeMap<String, Vec<String>>> {
    let Some(path) = path else {
        return parse_indication_catalog(BUILTIN_CATALOG);
    };

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let file: CatalogFile = toml::from_str(&content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })?;

    tracing::info!(
        "已加载适应症目录: {} ({} 个集合)",
        path.file_name().unwrap_or_default().to_string_lossy(),
        file.sets.len()
    );

    Ok(file.sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let sets = parse_indication_catalog(BUILTIN_CATALOG).unwrap();
        assert!(sets.contains_key("antidepressants"));
        assert!(sets.contains_key("neuroleptics"));
        assert!(sets["normotimics"].is_empty());
        assert!(!sets.contains_key("general"));
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let err = load_indication_catalog(Some(Path::new("no/such/catalog.toml")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no/such/catalog.toml"));
    }
}
