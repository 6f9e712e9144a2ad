//! 违规监控服务 - 业务能力层
//!
//! 两个独立检测器合并为一条事件流：
//! - 空闲检测：每秒计数，任何交互清零，达到阈值记一次违规并清零
//! - 焦点检测：页面隐藏或窗口失焦立即记一次违规（不去抖）

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::infrastructure::TaskHandle;
use crate::models::ViolationKind;
use crate::services::countdown::TICK_PERIOD;

/// 表示"用户在场"的交互
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    PointerMove,
    KeyPress,
    Scroll,
    Click,
    Touch,
}

/// 宿主（界面层）发出的原始事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Presence(Interaction),
    VisibilityChanged { visible: bool },
    WindowBlur,
}

/// 宿主事件总线
///
/// 每个订阅者一条无界队列，焦点事件不会因为积压被丢弃。
/// 监控器启动时订阅（注册监听），取消时接收端被释放即退订。
#[derive(Debug, Clone)]
pub struct HostBus {
    listeners: Arc<Mutex<Vec<mpsc::UnboundedSender<HostEvent>>>>,
}

impl HostBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 发布事件，返回当前监听者数量
    pub fn publish(&self, event: HostEvent) -> usize {
        let mut listeners = self.lock();
        listeners.retain(|tx| tx.send(event).is_ok());
        listeners.len()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    pub fn listener_count(&self) -> usize {
        let mut listeners = self.lock();
        listeners.retain(|tx| !tx.is_closed());
        listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<HostEvent>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HostBus {
    fn default() -> Self {
        Self::new()
    }
}

/// 监控器发给控制器的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    Violation(ViolationKind),
}

/// 空闲秒数计数器
#[derive(Debug, Clone)]
pub struct IdleCounter {
    seconds: u32,
    threshold: u32,
}

impl IdleCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            seconds: 0,
            threshold: threshold.max(1),
        }
    }

    /// 过去一秒无交互；达到阈值时返回 true 并清零
    pub fn tick(&mut self) -> bool {
        self.seconds += 1;
        if self.seconds >= self.threshold {
            self.seconds = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.seconds = 0;
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }
}

/// 违规上限策略，达到上限只报告一次
#[derive(Debug, Clone)]
pub struct ViolationPolicy {
    max_violations: usize,
    raised: bool,
}

impl ViolationPolicy {
    pub fn new(max_violations: usize) -> Self {
        Self {
            max_violations,
            raised: false,
        }
    }

    /// 每次追加违规后调用，首次达到上限时返回 true
    pub fn check(&mut self, total: usize) -> bool {
        if !self.raised && total >= self.max_violations {
            self.raised = true;
            return true;
        }
        false
    }

    pub fn max_violations(&self) -> usize {
        self.max_violations
    }
}

/// 监控参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorPolicy {
    pub inactivity_threshold_secs: u32,
    pub max_violations: usize,
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self {
            inactivity_threshold_secs: 15,
            max_violations: 3,
        }
    }
}

impl From<&crate::config::Config> for MonitorPolicy {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            inactivity_threshold_secs: config.inactivity_threshold_secs,
            max_violations: config.max_violations,
        }
    }
}

/// 运行中的违规监控器
#[derive(Debug)]
pub struct ViolationMonitor {
    task: TaskHandle,
    policy: ViolationPolicy,
}

impl ViolationMonitor {
    /// 注册宿主监听并启动空闲计时
    pub fn start(
        bus: &HostBus,
        policy: MonitorPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        // 在 spawn 之前订阅，启动后立刻发布的事件也不会丢
        let host_rx = bus.subscribe();
        let threshold = policy.inactivity_threshold_secs;
        let handle = tokio::spawn(run_detectors(host_rx, threshold, tx));

        (
            Self {
                task: TaskHandle::new("violation-monitor", handle),
                policy: ViolationPolicy::new(policy.max_violations),
            },
            rx,
        )
    }

    /// 控制器追加违规后调用；首次达到上限返回 true
    pub fn check_threshold(&mut self, total: usize) -> bool {
        self.policy.check(total)
    }

    pub fn max_violations(&self) -> usize {
        self.policy.max_violations()
    }

    /// 退订宿主事件并停止空闲计时，可重复调用
    pub fn cancel(&mut self) {
        self.task.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }
}

async fn run_detectors(
    host_rx: mpsc::UnboundedReceiver<HostEvent>,
    threshold: u32,
    tx: mpsc::UnboundedSender<MonitorEvent>,
) {
    let mut host_rx = Some(host_rx);
    let mut idle = IdleCounter::new(threshold);
    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let violation = tokio::select! {
            biased;
            received = next_host_event(&mut host_rx) => match received {
                Some(HostEvent::Presence(_)) => {
                    idle.reset();
                    None
                }
                Some(HostEvent::VisibilityChanged { visible: true }) => None,
                Some(HostEvent::VisibilityChanged { visible: false } | HostEvent::WindowBlur) => {
                    Some(ViolationKind::FocusLoss)
                }
                None => {
                    // 总线已关闭，只保留空闲检测
                    debug!("宿主事件总线已关闭");
                    host_rx = None;
                    None
                }
            },
            _ = ticker.tick() => idle.tick().then_some(ViolationKind::Inactivity),
        };

        if let Some(kind) = violation {
            if tx.send(MonitorEvent::Violation(kind)).is_err() {
                break;
            }
        }
    }
}

async fn next_host_event(
    rx: &mut Option<mpsc::UnboundedReceiver<HostEvent>>,
) -> Option<HostEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
