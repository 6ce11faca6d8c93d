// ==========================================
// 线上格式常量 (全部为大端、相对各自头部起点的偏移)
// ==========================================

// --- Ethernet / 802.1Q ---
pub const ETHER_ADDR_LEN: usize = 6;
pub const ETHER_DHOST: usize = 0;
pub const ETHER_SHOST: usize = 6;
pub const ETHER_TYPE: usize = 12;
pub const ETHER_HEADER_LEN: usize = 14;

pub const VLAN_ENCAP_PROTO: usize = 16;
pub const VLAN_HEADER_LEN: usize = 18;

pub const ETHERTYPE_IP: u16 = libc::ETH_P_IP as u16;
pub const ETHERTYPE_IP6: u16 = libc::ETH_P_IPV6 as u16;
pub const ETHERTYPE_8021Q: u16 = libc::ETH_P_8021Q as u16;

// --- IPv4 ---
pub const IP_VHL: usize = 0;
pub const IP_TOS: usize = 1;
pub const IP_FRAG: usize = 6;
pub const IP_TTL: usize = 8;
pub const IP_PROTO: usize = 9;
pub const IP_SRC: usize = 12;
pub const IP_DST: usize = 16;
pub const IP_ADDR_LEN: usize = 4;
pub const IP_MIN_HEADER_LEN: usize = 20;
pub const IP_OFFMASK: u16 = 0x1FFF;

pub const IP_TOS_ECN_MASK: u8 = 0x03;
pub const IP_DSCP_MAX: u8 = 63;
pub const IP_ECN_MAX: u8 = 3;

// --- IPv6 (固定头，不走扩展头) ---
pub const IP6_NXT: usize = 6;
pub const IP6_SRC: usize = 8;
pub const IP6_DST: usize = 24;
pub const IP6_ADDR_LEN: usize = 16;
pub const IP6_HEADER_LEN: usize = 40;

// --- TCP / UDP 共用的端口布局 ---
pub const IP_PROTO_TCP: u8 = libc::IPPROTO_TCP as u8;
pub const IP_PROTO_UDP: u8 = libc::IPPROTO_UDP as u8;
pub const TH_SPORT: usize = 0;
pub const TH_DPORT: usize = 2;
pub const PORT_LEN: usize = 2;
/// 交换/改写端口前要求传输层至少有这么多字节
pub const MIN_TRANSPORT_LEN: usize = 8;
