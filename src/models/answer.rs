use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// 一道题的标准化答案
///
/// 未作答的字段保持 null / 空，不做任何自动填充。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// 学生自己选择的听写类型，未选择时为 null
    pub dictated_type: Option<String>,
    /// 国际非专利名（INN）
    pub mnn: String,
    pub trade_names: Vec<String>,
    pub forms: Vec<String>,
    pub indications: Vec<String>,
    /// 剂型 → 所选剂量，键集合始终等于当前选中的剂型
    pub form_dosages: BTreeMap<String, BTreeSet<String>>,
    pub doses: BTreeMap<String, DoseAnswer>,
    pub half_life: NumericRange,
    pub elimination: Vec<String>,
}

/// 某一类剂量（如日剂量）的主值和附加值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseAnswer {
    pub main: Option<i64>,
    pub extras: BTreeMap<String, Option<i64>>,
}

/// 数值区间，两端都可以缺省
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_serializes_nulls_not_defaults() {
        let value = serde_json::to_value(AnswerRecord::default()).unwrap();
        assert!(value["dictatedType"].is_null());
        assert_eq!(value["mnn"], "");
        assert!(value["tradeNames"].as_array().unwrap().is_empty());
        assert!(value["formDosages"].as_object().unwrap().is_empty());
        assert!(value["halfLife"]["from"].is_null());
        assert!(value["halfLife"]["to"].is_null());
    }
}
