//! 考试会话上下文
//!
//! 封装"这是谁的哪一场考试"，只用于日志前缀

use std::fmt::Display;

use uuid::Uuid;

use crate::models::ExamSession;

/// 考试会话上下文
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 场次名称
    pub session_name: String,

    pub student_name: String,

    pub group: String,

    /// 本次作答的唯一 ID
    pub exam_session_id: Uuid,
}

impl SessionCtx {
    pub fn new(session: &ExamSession) -> Self {
        Self {
            session_name: session.session_name.clone(),
            student_name: session.student_name.clone(),
            group: session.group.clone(),
            exam_session_id: session.exam_session_id,
        }
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.exam_session_id.simple().to_string();
        write!(
            f,
            "[场次 {} 学生 {} 组 {} #{}]",
            self.session_name,
            self.student_name,
            self.group,
            &id[..8]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefix() {
        let ctx = SessionCtx {
            session_name: "Фарм-1".to_string(),
            student_name: "Иванов Иван".to_string(),
            group: "101".to_string(),
            exam_session_id: Uuid::nil(),
        };
        assert_eq!(
            ctx.to_string(),
            "[场次 Фарм-1 学生 Иванов Иван 组 101 #00000000]"
        );
    }
}
