//! # Dictant Client
//!
//! 药理学听写考试的监考会话客户端
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 时钟抽象和后台任务句柄，只暴露能力
//! - `Clock` - 系统时钟 / 固定时钟
//! - `TaskHandle` - 唯一持有 tokio 任务，可重复取消
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心会话状态
//! - `CountdownTimer` - 每秒倒计时，到点只报告一次
//! - `ViolationMonitor` - 空闲检测 + 焦点检测
//! - `FormDosageSelection` - 剂型 → 剂量词表
//! - `AnswerAssembler` - 临时选择 → 标准化答卷
//! - `IndicationCatalog` - 适应症集合合并与解析
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场考试"的完整状态机
//! - `SessionCtx` - 日志上下文（场次 + 学生）
//! - `ExamController` - `NotStarted → InProgress → Submitting → Submitted`
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用初始化和主循环
//! - `orchestrator/console` - 终端输入 → 宿主事件 / 指令
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ExamBackend, HttpExamClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::Clock;
pub use models::{StudentCredentials, SubmissionPayload, SubmitKind};
pub use orchestrator::App;
pub use workflow::{ExamController, SessionCommand, SessionCtx, SessionUpdate};
