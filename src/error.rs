use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 后端 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 考试会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 后端 API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 后端返回非 200 响应，`message` 为后端给出的 `error` 文本
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 考试会话错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 票据为空，无法开始考试
    #[error("票据为空，无法开始考试")]
    InvalidTicket,
    /// 考试时长必须大于 0
    #[error("考试时长无效: {seconds} 秒")]
    InvalidDuration { seconds: i64 },
    /// 当前状态不允许该操作
    #[error("当前状态 {state} 不允许执行 {operation}")]
    InvalidState {
        state: String,
        operation: &'static str,
    },
    /// 学生登录信息不合法，`message` 直接展示给用户
    #[error("登录信息不合法: {message}")]
    InvalidCredentials { message: String },
    /// 票据中不存在该题目
    #[error("票据中不存在题目: {item_id}")]
    UnknownItem { item_id: String },
    /// 剂型未被选中或该选项不在剂型的候选列表中
    #[error("剂型 {form} 不接受剂量选项 {option}")]
    DosageRejected { form: String, option: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建状态不合法错误
    pub fn invalid_state(state: impl std::fmt::Display, operation: &'static str) -> Self {
        AppError::Session(SessionError::InvalidState {
            state: state.to_string(),
            operation,
        })
    }

    /// 面向用户的提示文本
    ///
    /// 后端返回的 `error` 文本和登录校验信息原样展示，其余错误使用通用提示。
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(ApiError::BadResponse {
                message: Some(msg), ..
            }) => msg.clone(),
            AppError::Api(ApiError::BadResponse { .. }) => "Ошибка старта диктанта".to_string(),
            AppError::Api(_) => "Ошибка подключения к серверу".to_string(),
            AppError::Session(SessionError::InvalidCredentials { message }) => message.clone(),
            AppError::Session(SessionError::InvalidTicket) => {
                "Билет пуст: не удалось начать диктант".to_string()
            }
            other => other.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_error_text() {
        let err = AppError::Api(ApiError::BadResponse {
            endpoint: "/sessions/start".to_string(),
            status: 400,
            message: Some("Неверный код".to_string()),
        });
        assert_eq!(err.user_message(), "Неверный код");
    }

    #[test]
    fn test_user_message_for_connectivity() {
        let err = AppError::api_request_failed(
            "/sessions/start",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(err.user_message(), "Ошибка подключения к серверу");
    }

    #[test]
    fn test_session_error_converts_into_app_error() {
        let err: AppError = SessionError::InvalidTicket.into();
        assert!(matches!(err, AppError::Session(SessionError::InvalidTicket)));
    }
}
