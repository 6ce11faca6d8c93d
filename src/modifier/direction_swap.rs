use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::{
    classify::{Classification, IpVersion, Transport, check_mac_header, classify_network, link_layer},
    error::{ConfigError, FrameError},
    frame::Frame,
    headers::*,
    modifier::{
        ModifierStats, Options, PacketModifier,
        args::{normalize, parse_bool},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapLayer {
    Ethernet,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
}

impl SwapLayer {
    pub const ALL: [SwapLayer; 5] = [
        SwapLayer::Ethernet,
        SwapLayer::Ipv4,
        SwapLayer::Ipv6,
        SwapLayer::Tcp,
        SwapLayer::Udp,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|layer| layer.key().eq_ignore_ascii_case(key.trim()))
    }

    pub fn key(&self) -> &'static str {
        match self {
            SwapLayer::Ethernet => "ETHERNET",
            SwapLayer::Ipv4 => "IPV4",
            SwapLayer::Ipv6 => "IPV6",
            SwapLayer::Tcp => "TCP",
            SwapLayer::Udp => "UDP",
        }
    }
}

/// 每层一个开关
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SwapLayers {
    pub ethernet: bool,
    pub ipv4: bool,
    pub ipv6: bool,
    pub tcp: bool,
    pub udp: bool,
}

impl SwapLayers {
    pub fn get(&self, layer: SwapLayer) -> bool {
        match layer {
            SwapLayer::Ethernet => self.ethernet,
            SwapLayer::Ipv4 => self.ipv4,
            SwapLayer::Ipv6 => self.ipv6,
            SwapLayer::Tcp => self.tcp,
            SwapLayer::Udp => self.udp,
        }
    }

    pub fn set(&mut self, layer: SwapLayer, on: bool) {
        match layer {
            SwapLayer::Ethernet => self.ethernet = on,
            SwapLayer::Ipv4 => self.ipv4 = on,
            SwapLayer::Ipv6 => self.ipv6 = on,
            SwapLayer::Tcp => self.tcp = on,
            SwapLayer::Udp => self.udp = on,
        }
    }

    pub fn from_options(options: &Options<'_>) -> Result<Self, ConfigError> {
        let mut layers = SwapLayers::default();
        for (key, value) in normalize(options)? {
            let layer = SwapLayer::from_key(&key).ok_or(ConfigError::UnknownOption(key.clone()))?;
            layers.set(layer, parse_bool(&key, value)?);
        }
        Ok(layers)
    }

    fn any(&self) -> bool {
        self.ethernet || self.ipv4 || self.ipv6 || self.tcp || self.udp
    }
}

// 不可变快照；swap_any 在构造时算好
#[derive(Debug)]
struct SwapSnapshot {
    layers: SwapLayers,
    swap_any: bool,
}

impl SwapSnapshot {
    fn new(layers: SwapLayers) -> Self {
        Self {
            swap_any: layers.any(),
            layers,
        }
    }
}

// ==========================================
// 方向交换：在开启的各层交换源/目的
// ==========================================
#[derive(Debug)]
pub struct NetworkDirectionSwap {
    config: ArcSwap<SwapSnapshot>,
    stats: ModifierStats,
}

impl NetworkDirectionSwap {
    pub fn new(layers: SwapLayers) -> Self {
        Self {
            config: ArcSwap::from_pointee(SwapSnapshot::new(layers)),
            stats: ModifierStats::default(),
        }
    }

    pub fn from_options(options: &Options<'_>) -> Result<Self, ConfigError> {
        Ok(Self::new(SwapLayers::from_options(options)?))
    }

    pub fn layers(&self) -> SwapLayers {
        self.config.load().layers
    }

    pub fn swap_any(&self) -> bool {
        self.config.load().swap_any
    }
}

impl PacketModifier for NetworkDirectionSwap {
    fn class_name(&self) -> &'static str {
        "NetworkDirectionSwap"
    }

    fn stats(&self) -> &ModifierStats {
        &self.stats
    }

    fn process(&self, mut frame: Frame) -> Result<Frame, FrameError> {
        // 每个包只读一次配置
        let snapshot = self.config.load();
        if !snapshot.swap_any {
            return Ok(frame);
        }
        let layers = snapshot.layers;

        frame.ensure_exclusive()?;
        check_mac_header(&frame)?;

        // 1. Ethernet：不看上层，直接换
        if layers.ethernet {
            frame.swap_ranges(ETHER_DHOST, ETHER_SHOST, ETHER_ADDR_LEN)?;
        }

        // 2. 网络层必须已经被标记过，且有相关的层开着
        let Some(net) = frame.network_header_offset() else {
            return Ok(frame);
        };
        let Some(link) = link_layer(&frame)? else {
            return Ok(frame);
        };
        let wanted = match link.ip_version() {
            Some(IpVersion::V4) => layers.ipv4 || layers.tcp || layers.udp,
            Some(IpVersion::V6) => layers.ipv6 || layers.tcp || layers.udp,
            None => false,
        };
        if !wanted {
            return Ok(frame);
        }
        let class = classify_network(&frame, link)?;

        match class.ip_version {
            Some(IpVersion::V4) => {
                if layers.ipv4 {
                    frame.swap_ranges(net + IP_SRC, net + IP_DST, IP_ADDR_LEN)?;
                }
                // 非首片不带传输层头
                if class.is_first_fragment {
                    swap_ports(&mut frame, &class, layers)?;
                }
            }
            Some(IpVersion::V6) => {
                if layers.ipv6 {
                    frame.swap_ranges(net + IP6_SRC, net + IP6_DST, IP6_ADDR_LEN)?;
                }
                swap_ports(&mut frame, &class, layers)?;
            }
            None => {}
        }

        Ok(frame)
    }

    fn configure(&self, options: &Options<'_>) -> Result<(), ConfigError> {
        let layers = SwapLayers::from_options(options)?;
        self.config.store(Arc::new(SwapSnapshot::new(layers)));
        info!(?layers, "NetworkDirectionSwap reconfigured");
        Ok(())
    }

    fn read_handler(&self, name: &str) -> Result<String, ConfigError> {
        let layer = SwapLayer::from_key(name).ok_or(ConfigError::UnknownHandler(name.to_string()))?;
        Ok(self.layers().get(layer).to_string())
    }

    fn write_handler(&self, name: &str, value: &str) -> Result<(), ConfigError> {
        let layer = SwapLayer::from_key(name).ok_or(ConfigError::UnknownHandler(name.to_string()))?;
        let on = parse_bool(layer.key(), value)?;
        self.config.rcu(|current| {
            let mut layers = current.layers;
            layers.set(layer, on);
            SwapSnapshot::new(layers)
        });
        info!(handler = layer.key(), on, "NetworkDirectionSwap handler written");
        Ok(())
    }
}

fn swap_ports(frame: &mut Frame, class: &Classification, layers: SwapLayers) -> Result<(), FrameError> {
    let enabled = match class.transport {
        Some(Transport::Tcp) => layers.tcp,
        Some(Transport::Udp) => layers.udp,
        None => false,
    };
    if !enabled {
        return Ok(());
    }
    let Some(th) = frame.transport_header_offset() else {
        return Ok(());
    };
    // 传输层不足 8 字节：不动
    if frame.len() < th + MIN_TRANSPORT_LEN {
        return Ok(());
    }
    frame.swap_ranges(th + TH_SPORT, th + TH_DPORT, PORT_LEN)
}
