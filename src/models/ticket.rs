use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 票据中的一道题（一个药品）
///
/// `item_id` 由后端给出，在整个会话内稳定且不透明。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketItem {
    #[serde(rename = "drug_id", deserialize_with = "deserialize_item_id")]
    pub item_id: String,
    #[serde(rename = "dictated_ru", default)]
    pub dictated_label: String,
    /// 后端附带的听写类型提示，仅作展示，不用于预填答案
    #[serde(rename = "dictated_kind", default, skip_serializing_if = "Option::is_none")]
    pub dictated_kind: Option<String>,
}

impl TicketItem {
    pub fn new(item_id: impl Into<String>, dictated_label: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            dictated_label: dictated_label.into(),
            dictated_kind: None,
        }
    }
}

/// `POST /sessions/start` 请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub code: String,
    pub student_name: String,
    pub group: String,
}

/// `POST /sessions/start` 成功响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    #[serde(default)]
    pub session_name: Option<String>,
    /// 考试时长（分钟）
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub ticket: Vec<TicketItem>,
    #[serde(default)]
    pub indication_key: Option<String>,
    #[serde(default)]
    pub indication_sets: Option<BTreeMap<String, Vec<String>>>,
}

/// 后端非 200 响应体
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

// drug_id 既可能是字符串也可能是整数
fn deserialize_item_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct ItemIdVisitor;

    impl<'de> Visitor<'de> for ItemIdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer item id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(ItemIdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_response_accepts_numeric_and_string_ids() {
        let json = r#"{
            "sessionName": "Психофармакология",
            "duration": 20,
            "indicationKey": "antidepressants",
            "ticket": [
                {"drug_id": "amitriptyline", "dictated_ru": "Амитриптилин", "dictated_kind": "mnn"},
                {"drug_id": 7, "dictated_ru": "Галоперидол"}
            ]
        }"#;
        let resp: StartResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.duration, 20);
        assert_eq!(resp.ticket.len(), 2);
        assert_eq!(resp.ticket[0].item_id, "amitriptyline");
        assert_eq!(resp.ticket[0].dictated_kind.as_deref(), Some("mnn"));
        assert_eq!(resp.ticket[1].item_id, "7");
        assert!(resp.indication_sets.is_none());
    }

    #[test]
    fn test_start_response_missing_ticket_is_empty() {
        let resp: StartResponse = serde_json::from_str(r#"{"sessionName": "x"}"#).unwrap();
        assert!(resp.ticket.is_empty());
        assert_eq!(resp.duration, 0);
    }

    #[test]
    fn test_start_request_wire_names() {
        let req = StartRequest {
            code: "TEST123".to_string(),
            student_name: "Иванов Иван".to_string(),
            group: "психиатр".to_string(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["studentName"], "Иванов Иван");
        assert_eq!(value["code"], "TEST123");
    }
}
