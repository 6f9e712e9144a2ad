/// 考试后端 API 客户端
///
/// 封装 `/sessions/start` 和 `/sessions/submit` 两个接口
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{ErrorResponse, StartRequest, StartResponse, SubmissionPayload};

const START_ENDPOINT: &str = "sessions/start";
const SUBMIT_ENDPOINT: &str = "sessions/submit";

/// 控制器看到的后端能力：开始考试拿票据、提交答卷
#[async_trait]
pub trait ExamBackend: Send + Sync {
    async fn start_session(&self, request: &StartRequest) -> AppResult<StartResponse>;

    async fn submit(&self, payload: &SubmissionPayload) -> AppResult<()>;
}

/// 基于 reqwest 的后端客户端
pub struct HttpExamClient {
    client: Client,
    base_url: String,
}

impl HttpExamClient {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl ExamBackend for HttpExamClient {
    async fn start_session(&self, request: &StartRequest) -> AppResult<StartResponse> {
        let url = self.url(START_ENDPOINT);
        debug!("开始考试请求: {} (学生: {})", url, request.student_name);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(START_ENDPOINT, e))?;

        let status = response.status();
        if !status.is_success() {
            // 错误响应体可能不是 JSON
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error);
            return Err(ApiError::BadResponse {
                endpoint: START_ENDPOINT.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: StartResponse = response.json().await.map_err(|e| {
            AppError::Api(ApiError::JsonParseFailed {
                source: Box::new(e),
            })
        })?;
        debug!("开始考试响应: 票据 {} 题, 时长 {} 分钟", body.ticket.len(), body.duration);
        Ok(body)
    }

    async fn submit(&self, payload: &SubmissionPayload) -> AppResult<()> {
        let url = self.url(SUBMIT_ENDPOINT);
        debug!("提交答卷 Payload: {}", serde_json::to_string(payload)?);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(SUBMIT_ENDPOINT, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::BadResponse {
                endpoint: SUBMIT_ENDPOINT.to_string(),
                status: status.as_u16(),
                message: None,
            }
            .into());
        }
        Ok(())
    }
}
