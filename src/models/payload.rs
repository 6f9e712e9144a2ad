use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use super::answer::AnswerRecord;
use super::session::{Violation, ViolationKind};

/// `warnings[]` 中的一项，只保留类型和顺序，不含时间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WarningRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<&Violation> for WarningRecord {
    fn from(violation: &Violation) -> Self {
        Self {
            kind: violation.kind.wire_name(),
        }
    }
}

/// `POST /sessions/submit` 请求体，构造后不再修改
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub session_name: String,
    pub exam_session_id: Uuid,
    pub student_name: String,
    pub group: String,
    #[serde(serialize_with = "serialize_iso")]
    pub start_time: DateTime<Utc>,
    #[serde(serialize_with = "serialize_iso")]
    pub end_time: DateTime<Utc>,
    pub warnings: Vec<WarningRecord>,
    pub answers: BTreeMap<String, AnswerRecord>,
    pub auto_submitted: bool,
}

impl SubmissionPayload {
    pub fn warning_count(&self, kind: ViolationKind) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.kind == kind.wire_name())
            .count()
    }
}

fn serialize_iso<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// 把违规列表展平为 `warnings[]`
pub fn flatten_warnings(violations: &[Violation]) -> Vec<WarningRecord> {
    violations.iter().map(WarningRecord::from).collect()
}
