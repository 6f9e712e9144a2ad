use crate::error::{AppResult, SessionError};
use crate::models::StartRequest;

/// 学生登录信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentCredentials {
    pub student_name: String,
    pub group: String,
    pub code: String,
}

impl StudentCredentials {
    pub fn new(
        student_name: impl Into<String>,
        group: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            student_name: student_name.into(),
            group: group.into(),
            code: code.into(),
        }
    }

    /// 校验并去除首尾空白，返回第一个不合法项的提示
    ///
    /// - 姓名至少 5 个字符且至少两段
    /// - 方向（组）不能为空
    /// - 考试码至少 3 个字符
    pub fn validate(&self) -> AppResult<StudentCredentials> {
        let name = self.student_name.trim();
        let parts = name.split_whitespace().count();
        if name.chars().count() < 5 || parts < 2 {
            return Err(rejected("Введите полное ФИО"));
        }

        let group = self.group.trim();
        if group.is_empty() {
            return Err(rejected(
                "Укажите направление подготовки (психиатр / невролог)",
            ));
        }

        let code = self.code.trim();
        if code.chars().count() < 3 {
            return Err(rejected("Код должен содержать минимум 3 символа"));
        }

        Ok(StudentCredentials::new(name, group, code))
    }

    pub fn to_start_request(&self) -> StartRequest {
        StartRequest {
            code: self.code.clone(),
            student_name: self.student_name.clone(),
            group: self.group.clone(),
        }
    }
}

fn rejected(message: &str) -> crate::AppError {
    SessionError::InvalidCredentials {
        message: message.to_string(),
    }
    .into()
}
