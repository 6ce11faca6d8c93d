// 单元测试用的报文构造器

use crate::headers::*;

pub const MAC_DST: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x0d];
pub const MAC_SRC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x05];
pub const IP_A: [u8; 4] = [10, 0, 0, 1];
pub const IP_B: [u8; 4] = [10, 0, 0, 2];
pub const SPORT: u16 = 40000;
pub const DPORT: u16 = 443;

pub fn ether(vlan: bool, ethertype: u16) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&MAC_DST);
    buf.extend_from_slice(&MAC_SRC);
    if vlan {
        buf.extend_from_slice(&ETHERTYPE_8021Q.to_be_bytes());
        buf.extend_from_slice(&100u16.to_be_bytes());
    }
    buf.extend_from_slice(&ethertype.to_be_bytes());
    buf
}

/// 端口 + 填充，总长 `len`
pub fn transport(len: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&SPORT.to_be_bytes());
    buf.extend_from_slice(&DPORT.to_be_bytes());
    buf.extend((0..len.saturating_sub(4)).map(|i| 0xa0 ^ i as u8));
    buf.truncate(len);
    buf
}

pub fn ipv4(vlan: bool, proto: u8, frag: u16, l4_len: usize) -> Vec<u8> {
    let mut buf = ether(vlan, ETHERTYPE_IP);
    let total = (IP_MIN_HEADER_LEN + l4_len) as u16;
    buf.extend_from_slice(&[0x45, 0xb9]);
    buf.extend_from_slice(&total.to_be_bytes());
    buf.extend_from_slice(&[0x12, 0x34]);
    buf.extend_from_slice(&frag.to_be_bytes());
    buf.extend_from_slice(&[64, proto, 0, 0]);
    buf.extend_from_slice(&IP_A);
    buf.extend_from_slice(&IP_B);
    buf.extend(transport(l4_len));
    buf
}

pub fn ipv6(vlan: bool, nxt: u8, l4_len: usize) -> Vec<u8> {
    let mut buf = ether(vlan, ETHERTYPE_IP6);
    buf.extend_from_slice(&[0x60, 0, 0, 0]);
    buf.extend_from_slice(&(l4_len as u16).to_be_bytes());
    buf.extend_from_slice(&[nxt, 64]);
    buf.extend((0..16).map(|i| 0x20 + i as u8));
    buf.extend((0..16).map(|i| 0x40 + i as u8));
    buf.extend(transport(l4_len));
    buf
}
