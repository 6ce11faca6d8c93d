use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{
    error::ConfigError,
    modifier::{
        AutoMarkIpHeader, MarkIp6Header, NetworkDirectionSwap, NetworkHeaderFieldsRewrite,
        Options, PacketModifier,
    },
};

type Constructor = for<'a> fn(&Options<'a>) -> Result<Box<dyn PacketModifier>, ConfigError>;

fn auto_mark_ip_header(options: &Options<'_>) -> Result<Box<dyn PacketModifier>, ConfigError> {
    let element = AutoMarkIpHeader::new();
    element.configure(options)?;
    Ok(Box::new(element))
}

fn mark_ip6_header(options: &Options<'_>) -> Result<Box<dyn PacketModifier>, ConfigError> {
    let element = MarkIp6Header::new();
    element.configure(options)?;
    Ok(Box::new(element))
}

fn direction_swap(options: &Options<'_>) -> Result<Box<dyn PacketModifier>, ConfigError> {
    Ok(Box::new(NetworkDirectionSwap::from_options(options)?))
}

fn fields_rewrite(options: &Options<'_>) -> Result<Box<dyn PacketModifier>, ConfigError> {
    Ok(Box::new(NetworkHeaderFieldsRewrite::from_options(options)?))
}

// 类名 -> 构造函数
lazy_static! {
    static ref REGISTRY: HashMap<&'static str, Constructor> = {
        let mut m: HashMap<&'static str, Constructor> = HashMap::new();
        m.insert("AutoMarkIPHeader", auto_mark_ip_header);
        m.insert("MarkIP6Header", mark_ip6_header);
        m.insert("NetworkDirectionSwap", direction_swap);
        m.insert("NetworkHeaderFieldsRewrite", fields_rewrite);
        m
    };
}

/// 按类名建元素；配置不合法时元素不会被创建
pub fn build_element(
    class: &str,
    options: &Options<'_>,
) -> Result<Box<dyn PacketModifier>, ConfigError> {
    let constructor = REGISTRY
        .get(class)
        .ok_or_else(|| ConfigError::UnknownElement(class.to_string()))?;
    constructor(options)
}

pub fn element_classes() -> Vec<&'static str> {
    let mut classes: Vec<_> = REGISTRY.keys().copied().collect();
    classes.sort_unstable();
    classes
}
