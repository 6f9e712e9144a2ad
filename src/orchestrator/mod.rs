//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责应用生命周期和宿主接入，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用主流程
//! - 初始化（适应症目录、后端客户端、控制器）
//! - 开始考试、运行控制器直到交卷
//! - 打印控制器发布的界面更新
//!
//! ### `console` - 终端宿主
//! - 把 stdin 的一行翻译成宿主事件或控制器指令
//!
//! ## 层次关系
//!
//! ```text
//! app (生命周期 + 宿主转发)
//!     ↓
//! workflow::ExamController (一场考试的状态机)
//!     ↓
//! services (能力层：countdown / monitor / dosage / assembler / indications)
//!     ↓
//! infrastructure (基础设施：Clock / TaskHandle)
//! ```

pub mod app;
pub mod console;

pub use app::App;
pub use console::{parse_line, ConsoleInput};
