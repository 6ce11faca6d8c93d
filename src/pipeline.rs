use std::time::{Duration, Instant};

use chrono::Local;
use tracing::info;

use crate::{
    error::ConfigError,
    frame::Frame,
    modifier::{PacketModifier, StatsSnapshot},
};

struct Stage {
    name: String,
    element: Box<dyn PacketModifier>,
    // 上次报表时的累计值，用来算每周期增量
    last: StatsSnapshot,
}

// ==========================================
// 元素链 + 周期监控面板
// ==========================================
pub struct Pipeline {
    name: String,
    stages: Vec<Stage>,
    report_interval: Option<Duration>,
    last_report: Instant,
}

impl Pipeline {
    pub fn new(name: &str, report_interval: Option<Duration>) -> Self {
        Self {
            name: name.to_string(),
            stages: Vec::new(),
            report_interval,
            last_report: Instant::now(),
        }
    }

    pub fn push_element(&mut self, name: impl Into<String>, element: Box<dyn PacketModifier>) {
        self.stages.push(Stage {
            name: name.into(),
            element,
            last: StatsSnapshot::default(),
        });
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn element(&self, name: &str) -> Option<&dyn PacketModifier> {
        self.stages
            .iter()
            .find(|stage| stage.name == name)
            .map(|stage| stage.element.as_ref())
    }

    /// 依次过每个元素；任何一个丢包就返回 `None`
    pub fn process(&mut self, frame: Frame) -> Option<Frame> {
        let result = self
            .stages
            .iter()
            .try_fold(frame, |frame, stage| stage.element.simple_action(frame));
        self.check_and_report();
        result
    }

    pub fn read_handler(&self, element: &str, handler: &str) -> Result<String, ConfigError> {
        self.element(element)
            .ok_or_else(|| ConfigError::UnknownInstance(element.to_string()))?
            .read_handler(handler)
    }

    pub fn write_handler(&self, element: &str, handler: &str, value: &str) -> Result<(), ConfigError> {
        self.element(element)
            .ok_or_else(|| ConfigError::UnknownInstance(element.to_string()))?
            .write_handler(handler, value)
    }

    fn check_and_report(&mut self) {
        let Some(interval) = self.report_interval else {
            return;
        };
        let elapsed = self.last_report.elapsed();
        if elapsed < interval {
            return;
        }
        self.report(elapsed);
        self.last_report = Instant::now();
    }

    /// 打印并滚动每个元素的增量
    pub fn report(&mut self, elapsed: Duration) {
        let now_str = Local::now().format("%H:%M:%S").to_string();
        let secs = elapsed.as_secs_f64().max(f64::EPSILON);

        info!("[{}] pipeline {} ({:.1}s)", now_str, self.name, secs);
        info!(
            "{:<16} | {:<26} | {:>10} | {:>10} | {:>10} | {:>10}",
            "element", "class", "pass/s", "drop/s", "malformed", "clone_fail"
        );
        for stage in &mut self.stages {
            let now = stage.element.stats().snapshot();
            let delta = now.since(&stage.last);
            info!(
                "{:<16} | {:<26} | {:>10.1} | {:>10.1} | {:>10} | {:>10}",
                stage.name,
                stage.element.class_name(),
                delta.passed as f64 / secs,
                delta.dropped as f64 / secs,
                delta.malformed,
                delta.clone_failed
            );
            stage.last = now;
        }
    }
}
