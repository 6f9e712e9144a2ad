//! 考试会话控制器 - 流程层
//!
//! 核心职责：驱动"一场考试"的状态机
//!
//! `NotStarted → InProgress → Submitting → Submitted(Manual|Auto)`
//!
//! - 控制器是会话状态和违规列表的唯一写入者
//! - 倒计时和监控器通过 channel 把事件送进 `run` 循环
//! - `submit` 通过状态检查保证只执行一次

use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::ExamBackend;
use crate::config::Config;
use crate::error::{AppError, AppResult, SessionError};
use crate::infrastructure::Clock;
use crate::models::{
    flatten_warnings, ExamSession, SessionPlan, SessionState, StartResponse, StudentCredentials,
    SubmissionPayload, SubmitKind, Violation, ViolationKind,
};
use crate::services::{
    AnswerAssembler, CountdownTimer, HostBus, IndicationCatalog, MonitorEvent, MonitorPolicy,
    SelectionEdit, SelectionState, TimerEvent, ViolationMonitor,
};
use crate::utils::logging;
use crate::workflow::session_ctx::SessionCtx;

/// 宿主发给控制器的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// 点击"交卷"，弹出确认
    RequestSubmit,
    ConfirmSubmit,
    CancelSubmit,
    Edit { item_id: String, edit: SelectionEdit },
}

/// 违规统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarningsSummary {
    pub total: usize,
    pub inactivity: usize,
    pub visibility: usize,
}

impl WarningsSummary {
    pub fn of(session: &ExamSession) -> Self {
        Self {
            total: session.violation_count(),
            inactivity: session.count_of(ViolationKind::Inactivity),
            visibility: session.count_of(ViolationKind::FocusLoss),
        }
    }

    /// 违规弹窗里的提示
    pub fn alert_text(&self) -> String {
        format!("У вас уже {} предупреждений", self.total)
    }
}

impl fmt::Display for WarningsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Предупреждения: {} (бездействие {}, вкладки {})",
            self.total, self.inactivity, self.visibility
        )
    }
}

/// 交卷完成提示，手动和自动交卷文案不同
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitNotice {
    pub kind: SubmitKind,
    pub title: &'static str,
    pub text: &'static str,
}

impl SubmitNotice {
    pub fn for_kind(kind: SubmitKind) -> Self {
        match kind {
            SubmitKind::Auto => Self {
                kind,
                title: "Диктант завершён автоматически",
                text: "Время вышло или превышено количество предупреждений. Ваши ответы отправлены.",
            },
            SubmitKind::Manual => Self {
                kind,
                title: "Диктант завершён",
                text: "Ваши ответы отправлены. Спасибо!",
            },
        }
    }
}

/// 控制器发给界面层的更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Started { item_count: usize, allotted_secs: u32 },
    Countdown { remaining_secs: u32, display: String },
    Warning(WarningsSummary),
    ConfirmRequested,
    ConfirmCancelled,
    Completed(SubmitNotice),
}

/// 一次交卷的结果
///
/// `dispatch` 是后台发送任务，完成流程不等待它。
#[derive(Debug)]
pub struct SubmissionReceipt {
    pub kind: SubmitKind,
    pub payload: SubmissionPayload,
    pub dispatch: JoinHandle<()>,
}

/// 考试会话控制器
pub struct ExamController {
    backend: Arc<dyn ExamBackend>,
    clock: Clock,
    policy: MonitorPolicy,
    default_duration_minutes: u32,
    catalog: IndicationCatalog,
    host_bus: HostBus,
    updates: broadcast::Sender<SessionUpdate>,

    state: SessionState,
    session: Option<ExamSession>,
    ctx: Option<SessionCtx>,
    selections: SelectionState,
    confirm_pending: bool,

    timer: Option<CountdownTimer>,
    timer_rx: Option<mpsc::UnboundedReceiver<TimerEvent>>,
    monitor: Option<ViolationMonitor>,
    monitor_rx: Option<mpsc::UnboundedReceiver<MonitorEvent>>,
}

impl ExamController {
    pub fn new(backend: Arc<dyn ExamBackend>, config: &Config, catalog: IndicationCatalog) -> Self {
        let (updates, _) = broadcast::channel(128);
        Self {
            backend,
            clock: Clock::System,
            policy: MonitorPolicy::from(config),
            default_duration_minutes: config.default_duration_minutes,
            catalog,
            host_bus: HostBus::new(),
            updates,
            state: SessionState::NotStarted,
            session: None,
            ctx: None,
            selections: SelectionState::new(),
            confirm_pending: false,
            timer: None,
            timer_rx: None,
            monitor: None,
            monitor_rx: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&ExamSession> {
        self.session.as_ref()
    }

    pub fn selections(&self) -> &SelectionState {
        &self.selections
    }

    pub fn is_confirm_pending(&self) -> bool {
        self.confirm_pending
    }

    /// 宿主事件总线，界面层向这里发布交互/焦点事件
    pub fn host_bus(&self) -> HostBus {
        self.host_bus.clone()
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    fn ensure_can_start(&self) -> AppResult<()> {
        match self.state {
            SessionState::NotStarted | SessionState::Submitted(_) => Ok(()),
            other => Err(AppError::invalid_state(other, "start")),
        }
    }

    /// 校验登录信息，向后端请求票据并开始考试
    ///
    /// 任何一步失败都不会进入 `InProgress`。
    pub async fn start(&mut self, credentials: &StudentCredentials) -> AppResult<()> {
        self.ensure_can_start()?;
        let credentials = credentials.validate()?;

        info!("🔑 请求开始考试: {} ({})", credentials.student_name, credentials.group);
        let response = self
            .backend
            .start_session(&credentials.to_start_request())
            .await?;

        let plan = self.plan_from_response(&credentials, response);
        self.begin(plan)
    }

    fn plan_from_response(
        &self,
        credentials: &StudentCredentials,
        response: StartResponse,
    ) -> SessionPlan {
        let minutes = if response.duration > 0 {
            response.duration
        } else {
            warn!(
                "后端给出的时长无效 ({} 分钟)，使用默认 {} 分钟",
                response.duration, self.default_duration_minutes
            );
            i64::from(self.default_duration_minutes)
        };

        let mut catalog = self.catalog.clone();
        catalog.merge(response.indication_sets.as_ref());
        let indication_options = catalog.resolve(response.indication_key.as_deref());

        SessionPlan {
            session_name: response.session_name.unwrap_or_default(),
            student_name: credentials.student_name.clone(),
            group: credentials.group.clone(),
            allotted_seconds: minutes.saturating_mul(60),
            items: response.ticket,
            indication_options,
        }
    }

    /// 用已拿到的票据开始考试：记录开始时间，启动倒计时和监控器
    pub fn begin(&mut self, plan: SessionPlan) -> AppResult<()> {
        self.ensure_can_start()?;

        if plan.items.is_empty() {
            return Err(SessionError::InvalidTicket.into());
        }
        let allotted_seconds = u32::try_from(plan.allotted_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(SessionError::InvalidDuration {
                seconds: plan.allotted_seconds,
            })?;

        let started = Instant::now();
        let session = ExamSession {
            exam_session_id: Uuid::new_v4(),
            session_name: plan.session_name,
            student_name: plan.student_name,
            group: plan.group,
            started_at: self.clock.now(),
            allotted_seconds,
            items: plan.items,
            violations: Vec::new(),
            indication_options: plan.indication_options,
        };
        let ctx = SessionCtx::new(&session);

        let (timer, timer_rx) = CountdownTimer::start(allotted_seconds, started);
        let (monitor, monitor_rx) = ViolationMonitor::start(&self.host_bus, self.policy);

        logging::log_session_started(&ctx.to_string(), session.items.len(), allotted_seconds);
        self.publish(SessionUpdate::Started {
            item_count: session.items.len(),
            allotted_secs: allotted_seconds,
        });

        self.selections.clear();
        self.confirm_pending = false;
        self.timer = Some(timer);
        self.timer_rx = Some(timer_rx);
        self.monitor = Some(monitor);
        self.monitor_rx = Some(monitor_rx);
        self.session = Some(session);
        self.ctx = Some(ctx);
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// 处理倒计时事件；到点时自动交卷
    pub fn handle_timer_event(&mut self, event: TimerEvent) -> Option<SubmissionReceipt> {
        if self.state != SessionState::InProgress {
            return None;
        }
        match event {
            TimerEvent::Tick { remaining_secs } => {
                self.publish(SessionUpdate::Countdown {
                    remaining_secs,
                    display: logging::format_remaining(remaining_secs),
                });
                None
            }
            TimerEvent::Deadline => {
                info!("{} ⏰ 时间到，自动交卷", self.prefix());
                self.submit(SubmitKind::Auto)
            }
        }
    }

    /// 追加违规；首次达到上限时自动交卷
    pub fn handle_monitor_event(&mut self, event: MonitorEvent) -> Option<SubmissionReceipt> {
        if self.state != SessionState::InProgress {
            return None;
        }
        let MonitorEvent::Violation(kind) = event;
        let prefix = self.prefix();
        let session = self.session.as_mut()?;

        let violation = Violation {
            kind,
            occurred_at: self.clock.now(),
        };
        session.violations.push(violation);
        let total = session.violation_count();
        let summary = WarningsSummary::of(session);

        let monitor = self.monitor.as_mut()?;
        logging::log_violation(&prefix, &violation, total, monitor.max_violations());
        let threshold_reached = monitor.check_threshold(total);

        self.publish(SessionUpdate::Warning(summary));

        if threshold_reached {
            warn!("{} 🚫 违规次数达到上限，自动交卷", prefix);
            return self.submit(SubmitKind::Auto);
        }
        None
    }

    pub fn handle_command(&mut self, command: SessionCommand) -> AppResult<Option<SubmissionReceipt>> {
        match command {
            SessionCommand::RequestSubmit => self.request_submit().map(|_| None),
            SessionCommand::ConfirmSubmit => self.confirm_submit(),
            SessionCommand::CancelSubmit => self.cancel_submit().map(|_| None),
            SessionCommand::Edit { item_id, edit } => self.edit(&item_id, edit).map(|_| None),
        }
    }

    /// 手动交卷第一步：请求确认
    pub fn request_submit(&mut self) -> AppResult<()> {
        self.ensure_in_progress("request_submit")?;
        self.confirm_pending = true;
        self.publish(SessionUpdate::ConfirmRequested);
        Ok(())
    }

    /// 手动交卷第二步：确认
    pub fn confirm_submit(&mut self) -> AppResult<Option<SubmissionReceipt>> {
        self.ensure_in_progress("confirm_submit")?;
        if !self.confirm_pending {
            return Err(AppError::invalid_state(self.state, "confirm_submit"));
        }
        Ok(self.submit(SubmitKind::Manual))
    }

    pub fn cancel_submit(&mut self) -> AppResult<()> {
        self.ensure_in_progress("cancel_submit")?;
        if self.confirm_pending {
            self.confirm_pending = false;
            self.publish(SessionUpdate::ConfirmCancelled);
        }
        Ok(())
    }

    /// 写入一道题的临时选择
    pub fn edit(&mut self, item_id: &str, edit: SelectionEdit) -> AppResult<()> {
        self.ensure_in_progress("edit")?;
        let known = self
            .session
            .as_ref()
            .is_some_and(|session| session.contains_item(item_id));
        if !known {
            return Err(SessionError::UnknownItem {
                item_id: item_id.to_string(),
            }
            .into());
        }
        self.selections.edit(item_id, edit)
    }

    /// 交卷
    ///
    /// 只在 `InProgress` 下生效，重复触发直接返回 `None`。
    /// 网络结果不影响状态转换。
    pub fn submit(&mut self, kind: SubmitKind) -> Option<SubmissionReceipt> {
        if self.state != SessionState::InProgress {
            debug!("忽略交卷请求 ({:?})，当前状态 {}", kind, self.state);
            return None;
        }
        self.state = SessionState::Submitting;
        self.confirm_pending = false;

        // 1. 先停掉计时和监控
        self.stop_background();

        let prefix = self.prefix();
        let Some(session) = self.session.take() else {
            warn!("{} 会话数据缺失，放弃交卷", prefix);
            self.state = SessionState::NotStarted;
            return None;
        };

        // 2. 组装答卷
        let answers = AnswerAssembler::assemble(&session.items, &self.selections);

        // 3. 构造请求体
        let payload = SubmissionPayload {
            session_name: session.session_name.clone(),
            exam_session_id: session.exam_session_id,
            student_name: session.student_name.clone(),
            group: session.group.clone(),
            start_time: session.started_at,
            end_time: self.clock.now(),
            warnings: flatten_warnings(&session.violations),
            answers,
            auto_submitted: kind.is_auto(),
        };

        // 4. 后台发送，不重试也不等待
        let dispatch = {
            let backend = Arc::clone(&self.backend);
            let body = payload.clone();
            let prefix = prefix.clone();
            tokio::spawn(async move {
                let result = backend.submit(&body).await;
                logging::log_dispatch_result(&prefix, &result);
            })
        };

        // 5. 终态
        self.state = SessionState::Submitted(kind);
        logging::print_final_stats(&payload);

        self.selections.clear();
        self.ctx = None;
        self.publish(SessionUpdate::Warning(WarningsSummary::of(&session)));
        self.publish(SessionUpdate::Completed(SubmitNotice::for_kind(kind)));

        Some(SubmissionReceipt {
            kind,
            payload,
            dispatch,
        })
    }

    /// 事件循环：直到交卷为止
    pub async fn run(
        &mut self,
        commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
    ) -> AppResult<SubmissionReceipt> {
        self.ensure_in_progress("run")?;
        let mut commands_open = true;

        loop {
            let receipt = tokio::select! {
                biased;
                // 指令优先：同一时刻已经排队的编辑先于违规生效
                command = commands.recv(), if commands_open => match command {
                    Some(command) => match self.handle_command(command) {
                        Ok(receipt) => receipt,
                        Err(e) => {
                            warn!("{} 指令被拒绝: {}", self.prefix(), e);
                            None
                        }
                    },
                    None => {
                        debug!("{} 指令通道已关闭，等待计时结束", self.prefix());
                        commands_open = false;
                        None
                    }
                },
                event = recv_or_pending(&mut self.timer_rx) => self.handle_timer_event(event),
                event = recv_or_pending(&mut self.monitor_rx) => self.handle_monitor_event(event),
            };

            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
        }
    }

    fn ensure_in_progress(&self, operation: &'static str) -> AppResult<()> {
        if self.state == SessionState::InProgress {
            Ok(())
        } else {
            Err(AppError::invalid_state(self.state, operation))
        }
    }

    fn stop_background(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
        if let Some(mut monitor) = self.monitor.take() {
            monitor.cancel();
        }
        self.timer_rx = None;
        self.monitor_rx = None;
    }

    fn publish(&self, update: SessionUpdate) {
        // 没有订阅者时发送失败，忽略即可
        let _ = self.updates.send(update);
    }

    fn prefix(&self) -> String {
        self.ctx
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "[无会话]".to_string())
    }
}

/// 接收端已关闭或不存在时永远挂起
async fn recv_or_pending<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> T {
    let Some(inner) = rx.as_mut() else {
        return std::future::pending().await;
    };
    if let Some(value) = inner.recv().await {
        return value;
    }
    *rx = None;
    std::future::pending().await
}
