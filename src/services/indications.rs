//! 适应症目录服务
//!
//! 内置集合与服务端下发的集合合并，`general` 总是重新生成。

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

/// 汇总集合的键
pub const GENERAL_KEY: &str = "general";

#[derive(Debug, Clone, Default)]
pub struct IndicationCatalog {
    sets: BTreeMap<String, Vec<String>>,
}

impl IndicationCatalog {
    pub fn new(builtin: BTreeMap<String, Vec<String>>) -> Self {
        let mut catalog = Self { sets: builtin };
        catalog.rebuild_general();
        catalog
    }

    /// 用服务端集合覆盖同名集合，然后重新生成 `general`
    pub fn merge(&mut self, server_sets: Option<&BTreeMap<String, Vec<String>>>) {
        let Some(server_sets) = server_sets else {
            return;
        };
        for (key, values) in server_sets {
            if key == GENERAL_KEY {
                continue;
            }
            debug!("服务端适应症集合覆盖: {} ({} 项)", key, values.len());
            self.sets.insert(key.clone(), values.clone());
        }
        self.rebuild_general();
    }

    fn rebuild_general(&mut self) {
        let mut seen = HashSet::new();
        let general: Vec<String> = self
            .sets
            .iter()
            .filter(|(key, _)| key.as_str() != GENERAL_KEY)
            .flat_map(|(_, values)| values.iter())
            .filter(|value| seen.insert(value.as_str()))
            .cloned()
            .collect();
        self.sets.insert(GENERAL_KEY.to_string(), general);
    }

    /// 按 `indicationKey` 取本场考试的适应症列表，未知键回退到 `general`
    pub fn resolve(&self, key: Option<&str>) -> Vec<String> {
        let key = key.map(str::trim).filter(|k| !k.is_empty());
        if let Some(values) = key.and_then(|k| self.sets.get(k)) {
            return values.clone();
        }
        if let Some(k) = key {
            warn!("未知的适应症集合 '{}'，使用 general", k);
        }
        self.sets.get(GENERAL_KEY).cloned().unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_general_is_deduplicated_union() {
        let catalog = IndicationCatalog::new(sets(&[
            ("neuroleptics", &["шизофрения", "ОКР"]),
            ("antidepressants", &["Депрессии", "ОКР"]),
        ]));
        assert_eq!(
            catalog.resolve(Some(GENERAL_KEY)),
            vec!["Депрессии", "ОКР", "шизофрения"]
        );
    }

    #[test]
    fn test_server_sets_override_and_regenerate_general() {
        let mut catalog = IndicationCatalog::new(sets(&[("antidepressants", &["Депрессии"])]));
        catalog.merge(Some(&sets(&[
            ("antidepressants", &["ОКР"]),
            ("normotimics", &["биполярное расстройство"]),
            ("general", &["ignored"]),
        ])));

        assert_eq!(catalog.resolve(Some("antidepressants")), vec!["ОКР"]);
        assert_eq!(
            catalog.resolve(Some("general")),
            vec!["ОКР", "биполярное расстройство"]
        );
    }

    #[test]
    fn test_unknown_or_missing_key_falls_back_to_general() {
        let catalog = IndicationCatalog::new(sets(&[("neuroleptics", &["шизофрения"])]));
        assert_eq!(catalog.resolve(Some("nootropics")), vec!["шизофрения"]);
        assert_eq!(catalog.resolve(None), vec!["шизофрения"]);
        assert_eq!(catalog.resolve(Some("  ")), vec!["шизофрения"]);
    }

    #[test]
    fn test_empty_catalog_resolves_empty() {
        let catalog = IndicationCatalog::default();
        assert!(catalog.resolve(Some("anything")).is_empty());
        assert_eq!(catalog.keys().count(), 0);
    }
}
