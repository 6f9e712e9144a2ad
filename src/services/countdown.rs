//! 倒计时服务 - 业务能力层
//!
//! 只负责"剩余时间 / 到点"判断，不关心交卷流程

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::infrastructure::TaskHandle;

/// 计时和空闲检测的统一节拍
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// 倒计时发给控制器的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// 每秒一次，携带剩余秒数
    Tick { remaining_secs: u32 },
    /// 时间到，整个会话只会出现一次
    Deadline,
}

/// 单次节拍的计算结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining_secs: u32,
    pub deadline: bool,
}

/// 纯逻辑倒计时
///
/// `remaining = allotted - floor(elapsed)`，下限为 0；
/// 第一次 `remaining <= 0` 时报告到点，之后不再报告。
#[derive(Debug, Clone)]
pub struct Countdown {
    allotted_secs: u32,
    fired: bool,
}

impl Countdown {
    pub fn new(allotted_secs: u32) -> Self {
        Self {
            allotted_secs,
            fired: false,
        }
    }

    pub fn remaining_after(&self, elapsed: Duration) -> u32 {
        let elapsed_secs = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);
        self.allotted_secs.saturating_sub(elapsed_secs)
    }

    pub fn observe(&mut self, elapsed: Duration) -> CountdownTick {
        let remaining_secs = self.remaining_after(elapsed);
        let deadline = remaining_secs == 0 && !self.fired;
        if deadline {
            self.fired = true;
        }
        CountdownTick {
            remaining_secs,
            deadline,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// 运行中的倒计时
///
/// 唯一订阅者是控制器，事件通过 `start` 返回的接收端送达。
#[derive(Debug)]
pub struct CountdownTimer {
    task: TaskHandle,
}

impl CountdownTimer {
    /// 启动倒计时，第一拍立即触发
    ///
    /// `started` 是会话开始的单调时刻，控制器在同一次 `begin` 调用中
    /// 同时记录它和 `ExamSession.started_at`，剩余时间都从这一刻起算。
    pub fn start(
        allotted_secs: u32,
        started: Instant,
    ) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut countdown = Countdown::new(allotted_secs);
            let mut ticker = interval(TICK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let tick = countdown.observe(started.elapsed());
                if tx
                    .send(TimerEvent::Tick {
                        remaining_secs: tick.remaining_secs,
                    })
                    .is_err()
                {
                    break;
                }
                if tick.deadline {
                    let _ = tx.send(TimerEvent::Deadline);
                    break;
                }
            }
        });

        (
            Self {
                task: TaskHandle::new("countdown", handle),
            },
            rx,
        )
    }

    /// 停止所有后续节拍，可重复调用
    pub fn cancel(&mut self) {
        self.task.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_is_floored_and_clamped() {
        let countdown = Countdown::new(10);
        assert_eq!(countdown.remaining_after(Duration::from_millis(0)), 10);
        assert_eq!(countdown.remaining_after(Duration::from_millis(1999)), 9);
        assert_eq!(countdown.remaining_after(Duration::from_secs(10)), 0);
        assert_eq!(countdown.remaining_after(Duration::from_secs(3600)), 0);
    }

    #[test]
    fn test_deadline_reported_once() {
        let mut countdown = Countdown::new(2);
        assert!(!countdown.observe(Duration::from_secs(0)).deadline);
        assert!(!countdown.observe(Duration::from_secs(1)).deadline);
        assert!(countdown.observe(Duration::from_secs(2)).deadline);
        assert!(!countdown.observe(Duration::from_secs(3)).deadline);
        assert!(!countdown.observe(Duration::from_secs(4)).deadline);
        assert!(countdown.has_fired());
    }

    #[test]
    fn test_never_fires_before_allotted() {
        for allotted in 1..=30u32 {
            let mut countdown = Countdown::new(allotted);
            let first = (0..=allotted + 5)
                .find(|s| countdown.observe(Duration::from_secs(u64::from(*s))).deadline);
            assert_eq!(first, Some(allotted));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_emits_ticks_then_single_deadline() {
        let (_timer, mut rx) = CountdownTimer::start(2, Instant::now());
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                TimerEvent::Tick { remaining_secs: 2 },
                TimerEvent::Tick { remaining_secs: 1 },
                TimerEvent::Tick { remaining_secs: 0 },
                TimerEvent::Deadline,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_counts_from_session_start() {
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let (_timer, mut rx) = CountdownTimer::start(5, started);
        assert_eq!(rx.recv().await, Some(TimerEvent::Tick { remaining_secs: 4 }));
        assert_eq!(rx.recv().await, Some(TimerEvent::Tick { remaining_secs: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_reaches_deadline() {
        let (mut timer, mut rx) = CountdownTimer::start(3, Instant::now());
        timer.cancel();
        timer.cancel();
        assert!(timer.is_cancelled());
        while let Some(event) = rx.recv().await {
            assert_ne!(event, TimerEvent::Deadline);
        }
    }
}
