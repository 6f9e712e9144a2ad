//! 应用主流程 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：加载适应症目录、创建后端客户端和控制器
//! 2. **开始考试**：登录校验 + 请求票据
//! 3. **宿主转发**：把终端输入转成宿主事件和控制器指令
//! 4. **界面更新**：把控制器发布的更新写入日志
//!
//! 本模块不做任何会话状态判断，全部委托给 `ExamController`。

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::clients::{ExamBackend, HttpExamClient};
use crate::config::Config;
use crate::models::{load_indication_catalog, StudentCredentials};
use crate::orchestrator::console::{self, ConsoleInput, HELP_TEXT};
use crate::services::dosage;
use crate::services::{HostBus, HostEvent, IndicationCatalog, Interaction};
use crate::utils::logging;
use crate::workflow::{ExamController, SessionCommand, SessionUpdate, SubmissionReceipt};

/// 应用主结构
pub struct App {
    controller: ExamController,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config.api_base_url, config.max_violations);

        let catalog_path = config.indication_catalog_path.as_deref().map(Path::new);
        let catalog = IndicationCatalog::new(load_indication_catalog(catalog_path).await?);
        info!("📚 适应症集合: {}", catalog.keys().collect::<Vec<_>>().join(", "));
        let backend: Arc<dyn ExamBackend> = Arc::new(HttpExamClient::new(&config)?);

        Ok(Self::with_backend(&config, backend, catalog))
    }

    /// 使用指定后端创建应用
    pub fn with_backend(
        config: &Config,
        backend: Arc<dyn ExamBackend>,
        catalog: IndicationCatalog,
    ) -> Self {
        Self {
            controller: ExamController::new(backend, config, catalog),
        }
    }

    pub fn controller(&self) -> &ExamController {
        &self.controller
    }

    /// 开始考试并运行到交卷为止
    ///
    /// `input` 的每一行都会被翻译成宿主事件或指令。
    pub async fn run<R>(
        &mut self,
        credentials: &StudentCredentials,
        input: R,
    ) -> Result<SubmissionReceipt>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let printer = spawn_update_printer(self.controller.subscribe_updates());

        if let Err(e) = self.controller.start(credentials).await {
            error!("❌ 无法开始考试: {}", e.user_message());
            printer.abort();
            return Err(e.into());
        }
        if let Some(session) = self.controller.session() {
            for (index, item) in session.items.iter().enumerate() {
                info!("  {}. [{}] {}", index + 1, item.item_id, item.dictated_label);
            }
            info!("💊 剂型: {}", forms_legend());
            info!("🩺 适应症: {}", session.indication_options.join(" | "));
        }

        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let reader = spawn_console_reader(input, self.controller.host_bus(), command_tx);

        let result = self.controller.run(&mut command_rx).await;

        reader.abort();
        // 让最后的完成提示先打印出来
        tokio::task::yield_now().await;
        printer.abort();

        Ok(result?)
    }
}

fn forms_legend() -> String {
    let mut forms: Vec<&str> = dosage::known_forms().collect();
    forms.sort_unstable();
    forms
        .into_iter()
        .map(|form| format!("{}={}", form, dosage::form_label(form)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn spawn_update_printer(mut updates: broadcast::Receiver<SessionUpdate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(SessionUpdate::Started {
                    item_count,
                    allotted_secs,
                }) => info!(
                    "📝 共 {} 题, 剩余 {}",
                    item_count,
                    logging::format_remaining(allotted_secs)
                ),
                Ok(SessionUpdate::Countdown {
                    remaining_secs,
                    display: clock_text,
                }) => {
                    // 每分钟和最后 10 秒提示一次
                    if remaining_secs % 60 == 0 || remaining_secs <= 10 {
                        info!("⏳ {}", clock_text);
                    }
                }
                Ok(SessionUpdate::Warning(summary)) => {
                    warn!("⚠️ {} | {}", summary.alert_text(), summary)
                }
                Ok(SessionUpdate::ConfirmRequested) => {
                    info!("❓ Завершить диктант? (confirm / cancel)")
                }
                Ok(SessionUpdate::ConfirmCancelled) => info!("↩️ 已取消交卷"),
                Ok(SessionUpdate::Completed(notice)) => {
                    info!("✅ {}", notice.title);
                    info!("{}", notice.text);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("界面更新积压，跳过 {} 条", skipped)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn spawn_console_reader<R>(
    input: R,
    bus: HostBus,
    commands: mpsc::UnboundedSender<SessionCommand>,
) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("读取输入失败: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            // 敲键盘本身就是一次交互
            bus.publish(HostEvent::Presence(Interaction::KeyPress));

            match console::parse_line(&line) {
                Some(ConsoleInput::Host(event)) => {
                    bus.publish(event);
                }
                Some(ConsoleInput::Command(command)) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                Some(ConsoleInput::Help) => info!("{}", HELP_TEXT),
                None => warn!(
                    "无法识别的输入: {} (输入 help 查看用法)",
                    logging::truncate_text(&line, 40)
                ),
            }
        }
    })
}
