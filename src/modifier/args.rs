use std::{collections::HashSet, net::Ipv4Addr};

use crate::error::ConfigError;

use super::Options;

// ==========================================
// 配置值解析 (布尔 / 整数 / MAC / IPv4)
// ==========================================

/// KEY 统一转大写，重复的 KEY 直接报错
pub fn normalize<'a>(options: &Options<'a>) -> Result<Vec<(String, &'a str)>, ConfigError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(options.len());
    for (key, value) in options {
        let key = key.trim().to_ascii_uppercase();
        if !seen.insert(key.clone()) {
            return Err(ConfigError::DuplicateOption(key));
        }
        out.push((key, *value));
    }
    Ok(out)
}

pub fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_u64(key: &str, value: &str, expected: &'static str) -> Result<u64, ConfigError> {
    let v = value.trim();
    let parsed = match v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => v.parse::<u64>(),
    };
    parsed.map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}

fn bounded(key: &str, value: &str, max: u64, expected: &'static str) -> Result<u64, ConfigError> {
    let n = parse_u64(key, value, expected)?;
    if n > max {
        return Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value: n,
            max,
        });
    }
    Ok(n)
}

pub fn parse_u8(key: &str, value: &str, max: u8) -> Result<u8, ConfigError> {
    Ok(bounded(key, value, max as u64, "an integer")? as u8)
}

pub fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    Ok(bounded(key, value, u16::MAX as u64, "an integer")? as u16)
}

pub fn parse_mac(key: &str, value: &str) -> Result<[u8; 6], ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "an Ethernet address",
    };
    let mut mac = [0u8; 6];
    let mut parts = value.trim().split([':', '-']);
    for byte in mac.iter_mut() {
        let part = parts.next().ok_or_else(invalid)?;
        if part.is_empty() || part.len() > 2 {
            return Err(invalid());
        }
        *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(mac)
}

pub fn parse_ipv4(key: &str, value: &str) -> Result<Ipv4Addr, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "an IPv4 address",
    })
}

pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
