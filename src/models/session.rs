use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ticket::TicketItem;

/// 交卷方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitKind {
    /// 学生确认后手动交卷
    Manual,
    /// 超时或违规达到上限后自动交卷
    Auto,
}

impl SubmitKind {
    pub fn is_auto(self) -> bool {
        matches!(self, SubmitKind::Auto)
    }
}

/// 会话状态机
///
/// `NotStarted → InProgress → Submitting → Submitted`，`Submitted` 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Submitting,
    Submitted(SubmitKind),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "NotStarted"),
            SessionState::InProgress => write!(f, "InProgress"),
            SessionState::Submitting => write!(f, "Submitting"),
            SessionState::Submitted(kind) => write!(f, "Submitted({:?})", kind),
        }
    }
}

/// 违规类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// 长时间无操作
    Inactivity,
    /// 页面隐藏或窗口失去焦点
    FocusLoss,
}

impl ViolationKind {
    /// 提交给后端的 `warnings[].type` 值
    pub fn wire_name(self) -> &'static str {
        match self {
            ViolationKind::Inactivity => "inactivity",
            ViolationKind::FocusLoss => "visibility",
        }
    }
}

/// 一次违规记录，只追加不删除
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub occurred_at: DateTime<Utc>,
}

/// 开始考试所需的全部数据（已校验前的原始形态）
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub session_name: String,
    pub student_name: String,
    pub group: String,
    pub allotted_seconds: i64,
    pub items: Vec<TicketItem>,
    /// 本场考试可选的适应症列表
    pub indication_options: Vec<String>,
}

/// 进行中的考试会话
///
/// 只由控制器创建和修改，交卷后丢弃。
#[derive(Debug, Clone)]
pub struct ExamSession {
    pub exam_session_id: Uuid,
    pub session_name: String,
    pub student_name: String,
    pub group: String,
    pub started_at: DateTime<Utc>,
    pub allotted_seconds: u32,
    pub items: Vec<TicketItem>,
    pub violations: Vec<Violation>,
    pub indication_options: Vec<String>,
}

impl ExamSession {
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    pub fn count_of(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.item_id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(ViolationKind::Inactivity.wire_name(), "inactivity");
        assert_eq!(ViolationKind::FocusLoss.wire_name(), "visibility");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            SessionState::Submitted(SubmitKind::Auto).to_string(),
            "Submitted(Auto)"
        );
        assert_eq!(SessionState::InProgress.to_string(), "InProgress");
    }
}
