use std::{collections::BTreeMap, path::Path, time::Duration};

use serde::Deserialize;

use crate::{error::ConfigError, modifier::build_element, pipeline::Pipeline};

// ==========================================
// 宿主配置 (TOML)：绑定哪些队列 + 元素链
// ==========================================
#[derive(Debug, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_queues")]
    pub queues: Vec<u16>,
    #[serde(default = "default_queue_max_len")]
    pub queue_max_len: u32,
    /// 0 = 关闭监控面板
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_secs: u64,
    #[serde(default)]
    pub elements: Vec<ElementEntry>,
}

/// 一个 `[[elements]]` 条目
#[derive(Debug, Deserialize)]
pub struct ElementEntry {
    pub class: String,
    pub name: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
}

fn default_queues() -> Vec<u16> {
    vec![0]
}

fn default_queue_max_len() -> u32 {
    10000
}

fn default_monitor_interval() -> u64 {
    1
}

impl ElementEntry {
    /// TOML 里写 `TCP = true` 或 `TCP = "true"` 都行
    pub fn option_strings(&self) -> Vec<(String, String)> {
        self.options
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect()
    }
}

impl HostConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn monitor_interval(&self) -> Option<Duration> {
        (self.monitor_interval_secs > 0).then(|| Duration::from_secs(self.monitor_interval_secs))
    }

    /// 按顺序建出所有元素；任何一个配置不合法整个管道都不上线
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        let mut pipeline = Pipeline::new("RootPipeline", self.monitor_interval());
        for (i, entry) in self.elements.iter().enumerate() {
            let owned = entry.option_strings();
            let options: Vec<(&str, &str)> =
                owned.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            let element = build_element(&entry.class, &options)?;
            let name = entry.name.clone().unwrap_or_else(|| format!("{}@{}", entry.class, i));
            pipeline.push_element(name, element);
        }
        Ok(pipeline)
    }
}
