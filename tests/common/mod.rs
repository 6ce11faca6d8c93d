#![allow(dead_code)]

use nfq_rewriter::headers::*;

pub const MAC_DST: [u8; 6] = [0x52, 0x54, 0x00, 0x12, 0x34, 0x56];
pub const MAC_SRC: [u8; 6] = [0x52, 0x54, 0x00, 0xab, 0xcd, 0xef];
pub const IP_SRC_ADDR: [u8; 4] = [172, 16, 0, 10];
pub const IP_DST_ADDR: [u8; 4] = [172, 16, 0, 20];
pub const SPORT: u16 = 51000;
pub const DPORT: u16 = 8443;

fn link(vlan: bool, ethertype: u16) -> Vec<u8> {
    let mut buf = [MAC_DST, MAC_SRC].concat();
    if vlan {
        buf.extend_from_slice(&ETHERTYPE_8021Q.to_be_bytes());
        buf.extend_from_slice(&0x0064u16.to_be_bytes());
    }
    buf.extend_from_slice(&ethertype.to_be_bytes());
    buf
}

fn l4(len: usize) -> Vec<u8> {
    let mut buf = [SPORT.to_be_bytes(), DPORT.to_be_bytes()].concat();
    buf.extend((4..len).map(|i| (i * 7) as u8));
    buf.truncate(len);
    buf
}

pub fn ipv4_packet(vlan: bool, proto: u8, frag: u16, l4_len: usize) -> Vec<u8> {
    let mut buf = link(vlan, ETHERTYPE_IP);
    buf.push(0x45);
    buf.push(0x2e);
    buf.extend_from_slice(&((20 + l4_len) as u16).to_be_bytes());
    buf.extend_from_slice(&[0xbe, 0xef]);
    buf.extend_from_slice(&frag.to_be_bytes());
    buf.extend_from_slice(&[128, proto, 0xab, 0xcd]);
    buf.extend_from_slice(&IP_SRC_ADDR);
    buf.extend_from_slice(&IP_DST_ADDR);
    buf.extend(l4(l4_len));
    buf
}

pub fn ipv6_packet(vlan: bool, nxt: u8, l4_len: usize) -> Vec<u8> {
    let mut buf = link(vlan, ETHERTYPE_IP6);
    buf.extend_from_slice(&[0x60, 0x0a, 0xbc, 0xde]);
    buf.extend_from_slice(&(l4_len as u16).to_be_bytes());
    buf.extend_from_slice(&[nxt, 255]);
    buf.extend((0u8..16).map(|i| 0xf0 ^ i));
    buf.extend((0u8..16).map(|i| 0x0f ^ (i << 4)));
    buf.extend(l4(l4_len));
    buf
}
