mod common;

use common::*;
use nfq_rewriter::{
    Frame, PacketModifier,
    headers::*,
    modifier::{AutoMarkIpHeader, MarkIp6Header, NetworkDirectionSwap, NetworkHeaderFieldsRewrite, SwapLayers},
};
use proptest::prelude::*;

fn all_layers() -> SwapLayers {
    SwapLayers {
        ethernet: true,
        ipv4: true,
        ipv6: true,
        tcp: true,
        udp: true,
    }
}

fn mark(raw: Vec<u8>) -> Frame {
    let frame = AutoMarkIpHeader::new().process(Frame::new(raw)).unwrap();
    MarkIp6Header::new().process(frame).unwrap()
}

#[test]
fn ipv4_tcp_swaps_every_layer_and_keeps_payload() {
    let raw = ipv4_packet(false, IP_PROTO_TCP, 0, 60);
    let out = NetworkDirectionSwap::new(all_layers()).process(mark(raw.clone())).unwrap();
    let data = out.data();

    assert_eq!(data.len(), raw.len());
    assert_eq!(&data[0..6], &MAC_SRC);
    assert_eq!(&data[6..12], &MAC_DST);
    assert_eq!(&data[12..26], &raw[12..26]);
    assert_eq!(&data[26..30], &IP_DST_ADDR);
    assert_eq!(&data[30..34], &IP_SRC_ADDR);
    assert_eq!(&data[34..36], &DPORT.to_be_bytes());
    assert_eq!(&data[36..38], &SPORT.to_be_bytes());
    assert_eq!(&data[38..], &raw[38..]);
}

#[test]
fn tcp_flag_does_not_touch_udp_ports() {
    let swap = NetworkDirectionSwap::new(SwapLayers {
        tcp: true,
        ..Default::default()
    });
    let raw = ipv4_packet(false, IP_PROTO_UDP, 0, 16);
    let out = swap.process(mark(raw.clone())).unwrap();
    assert_eq!(out.data(), raw.as_slice());
}

#[test]
fn non_first_fragment_swaps_addresses_but_not_ports() {
    let swap = NetworkDirectionSwap::new(SwapLayers {
        ipv4: true,
        tcp: true,
        udp: true,
        ..Default::default()
    });
    for proto in [IP_PROTO_TCP, IP_PROTO_UDP] {
        let raw = ipv4_packet(false, proto, 0x20b9, 24);
        let out = swap.process(mark(raw.clone())).unwrap();
        let data = out.data();
        assert_eq!(&data[26..30], &IP_DST_ADDR);
        assert_eq!(&data[30..34], &IP_SRC_ADDR);
        assert_eq!(&data[34..], &raw[34..]);
    }
}

#[test]
fn vlan_ipv6_udp_uses_inner_protocol() {
    let swap = NetworkDirectionSwap::new(SwapLayers {
        udp: true,
        ..Default::default()
    });
    let raw = ipv6_packet(true, IP_PROTO_UDP, 12);
    let out = swap.process(mark(raw.clone())).unwrap();
    let data = out.data();
    // 18 字节链路头 + 40 字节 IPv6
    assert_eq!(&data[58..60], &DPORT.to_be_bytes());
    assert_eq!(&data[60..62], &SPORT.to_be_bytes());
    assert_eq!(&data[..58], &raw[..58]);
    assert_eq!(&data[62..], &raw[62..]);
}

#[test]
fn ttl_rewrite_leaves_other_ipv4_fields() {
    let rewrite = NetworkHeaderFieldsRewrite::from_options(&[("IPV4_TTL", "3")]).unwrap();
    let raw = ipv4_packet(true, IP_PROTO_TCP, 0, 20);
    let out = rewrite.process(Frame::new(raw.clone())).unwrap();
    let (data, ip) = (out.data(), 18);

    assert_eq!(data[ip + IP_TTL], 3);
    assert_eq!(data[ip + IP_TOS], raw[ip + IP_TOS]);
    assert_eq!(data[ip + IP_PROTO], raw[ip + IP_PROTO]);
    assert_eq!(&data[ip + IP_SRC..ip + IP_SRC + 4], &IP_SRC_ADDR);
    assert_eq!(&data[ip + IP_DST..ip + IP_DST + 4], &IP_DST_ADDR);
    assert_eq!(&data[..ip + IP_TTL], &raw[..ip + IP_TTL]);
    assert_eq!(&data[ip + IP_TTL + 1..], &raw[ip + IP_TTL + 1..]);
}

#[test]
fn truncated_frames_are_dropped_not_panicking() {
    let mark = AutoMarkIpHeader::new();
    let swap = NetworkDirectionSwap::new(all_layers());
    let raw = ipv4_packet(false, IP_PROTO_TCP, 0, 20);
    for len in 0..34 {
        let out = mark
            .simple_action(Frame::new(raw[..len].to_vec()))
            .and_then(|frame| swap.simple_action(frame));
        // 不到 12 字节换不了 MAC；读得出 IPv4 类型但头不全的在定位时丢掉
        assert_eq!(out.is_some(), (12..14).contains(&len), "len {len}");
    }
    assert_eq!(mark.stats().snapshot().malformed, 20);
    assert_eq!(swap.stats().snapshot().malformed, 12);
}

#[test]
fn ethernet_swap_does_not_need_a_whole_ip_header() {
    let swap = NetworkDirectionSwap::new(SwapLayers {
        ethernet: true,
        ..Default::default()
    });
    for raw in [ipv4_packet(true, IP_PROTO_UDP, 0, 8), ipv6_packet(false, IP_PROTO_TCP, 20)] {
        for len in 12..raw.len() {
            let out = swap.simple_action(Frame::new(raw[..len].to_vec())).unwrap();
            assert_eq!(&out.data()[0..6], &MAC_SRC);
            assert_eq!(&out.data()[6..12], &MAC_DST);
            assert_eq!(&out.data()[12..], &raw[12..len]);
        }
    }
    assert_eq!(swap.stats().snapshot().dropped, 0);
}

fn any_packet() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        (any::<bool>(), prop_oneof![Just(IP_PROTO_TCP), Just(IP_PROTO_UDP), Just(1u8)], any::<u16>(), 0usize..64)
            .prop_map(|(vlan, proto, frag, len)| ipv4_packet(vlan, proto, frag, len)),
        (any::<bool>(), prop_oneof![Just(IP_PROTO_TCP), Just(IP_PROTO_UDP), Just(58u8)], 0usize..64)
            .prop_map(|(vlan, nxt, len)| ipv6_packet(vlan, nxt, len)),
    ]
}

fn any_layers() -> impl Strategy<Value = SwapLayers> {
    any::<[bool; 5]>().prop_map(|[ethernet, ipv4, ipv6, tcp, udp]| SwapLayers {
        ethernet,
        ipv4,
        ipv6,
        tcp,
        udp,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn swap_twice_restores(raw in any_packet(), layers in any_layers()) {
        let swap = NetworkDirectionSwap::new(layers);
        let once = swap.process(mark(raw.clone())).unwrap();
        let twice = swap.process(once).unwrap();
        prop_assert_eq!(twice.data(), raw.as_slice());
    }

    #[test]
    fn disabled_swap_is_identity(raw in any_packet()) {
        let swap = NetworkDirectionSwap::new(SwapLayers::default());
        let out = swap.process(mark(raw.clone())).unwrap();
        prop_assert_eq!(out.data(), raw.as_slice());

        let rewrite = NetworkHeaderFieldsRewrite::from_options(&[]).unwrap();
        let out = rewrite.process(Frame::new(raw.clone())).unwrap();
        prop_assert_eq!(out.data(), raw.as_slice());
    }

    #[test]
    fn arbitrary_bytes_never_panic(raw in proptest::collection::vec(any::<u8>(), 0..96)) {
        let swap = NetworkDirectionSwap::new(all_layers());
        let rewrite = NetworkHeaderFieldsRewrite::from_options(&[
            ("ETH_TYPE", "0x0800"),
            ("IPV4_TTL", "1"),
            ("TCP_SRC", "1"),
            ("UDP_DST", "2"),
        ])
        .unwrap();
        let len = raw.len();
        if let Some(frame) = AutoMarkIpHeader::new().simple_action(Frame::new(raw.clone())) {
            if let Some(out) = swap.simple_action(frame) {
                prop_assert_eq!(out.len(), len);
            }
        }
        if let Some(out) = rewrite.simple_action(Frame::new(raw)) {
            prop_assert_eq!(out.len(), len);
        }
    }
}
