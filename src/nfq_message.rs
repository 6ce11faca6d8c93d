use nfq::{Message, Verdict};

use crate::{
    frame::Frame,
    headers::{ETHER_HEADER_LEN, ETHERTYPE_IP, ETHERTYPE_IP6},
};

// ==========================================
// NFQUEUE 只给三层报文：前面垫一个假的以太网头再进管道，出来再剥掉
// ==========================================
pub struct NfqMessage(Message);

impl NfqMessage {
    pub fn to_frame(&self) -> Frame {
        frame_from_l3(self.0.get_payload())
    }

    /// `None` = 管道丢包
    pub fn finish(self, frame: Option<Frame>) -> Message {
        let mut msg = self.0;
        match frame {
            Some(frame) => {
                msg.set_payload(l3_from_frame(frame));
                msg.set_verdict(Verdict::Accept);
            }
            None => msg.set_verdict(Verdict::Drop),
        }
        msg
    }
}

impl From<Message> for NfqMessage {
    fn from(value: Message) -> Self {
        Self(value)
    }
}

pub fn frame_from_l3(payload: &[u8]) -> Frame {
    // IP 版本号在第 0 字节高 4 位
    let ethertype = match payload.first().map(|b| b >> 4) {
        Some(4) => ETHERTYPE_IP,
        Some(6) => ETHERTYPE_IP6,
        _ => 0,
    };
    let mut data = Vec::with_capacity(ETHER_HEADER_LEN + payload.len());
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(&ethertype.to_be_bytes());
    data.extend_from_slice(payload);
    Frame::new(data)
}

pub fn l3_from_frame(frame: Frame) -> Vec<u8> {
    let mut data = frame.into_vec();
    data.drain(..ETHER_HEADER_LEN.min(data.len()));
    data
}
