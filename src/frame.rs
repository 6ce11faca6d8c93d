use std::ops::Range;
use std::sync::Arc;

use crate::error::FrameError;

// ==========================================
// 所有权标签：独占 or 引用计数共享
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Shared(usize),
}

#[derive(Debug)]
enum Storage {
    Owned(Vec<u8>),
    Shared(Arc<Vec<u8>>),
}

impl Storage {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Owned(data) => data.as_slice(),
            Storage::Shared(data) => data.as_slice(),
        }
    }
}

/// 一个数据包的字节缓冲区，外加 MAC / 网络层 / 传输层的头部标记。
///
/// 读操作全部带边界检查；写操作只允许在 [`Frame::ensure_exclusive`] 之后进行。
#[derive(Debug)]
pub struct Frame {
    storage: Storage,
    mac_header: Option<usize>,
    // (offset, len)，传输层起点 = offset + len
    network_header: Option<(usize, usize)>,
}

impl Frame {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            storage: Storage::Owned(data),
            mac_header: None,
            network_header: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn data(&self) -> &[u8] {
        self.storage.as_slice()
    }

    pub fn ownership(&self) -> Ownership {
        match &self.storage {
            Storage::Owned(_) => Ownership::Owned,
            Storage::Shared(data) => Ownership::Shared(Arc::strong_count(data)),
        }
    }

    /// 再造一个指向同一块存储的句柄，两边都变成 `Shared`
    pub fn share(&mut self) -> Frame {
        let shared = match std::mem::replace(&mut self.storage, Storage::Owned(Vec::new())) {
            Storage::Owned(data) => Arc::new(data),
            Storage::Shared(data) => data,
        };
        self.storage = Storage::Shared(Arc::clone(&shared));
        Frame {
            storage: Storage::Shared(shared),
            mac_header: self.mac_header,
            network_header: self.network_header,
        }
    }

    // ==========================================
    // Copy-on-write 守卫
    // ==========================================

    /// 保证接下来的写操作不会影响其他持有者。
    ///
    /// 已经独占：什么都不做。共享但只剩自己：直接接管存储。
    /// 否则克隆一份；分配失败时存储保持原样并返回 `CloneFailed`。
    pub fn ensure_exclusive(&mut self) -> Result<(), FrameError> {
        if let Storage::Owned(_) = self.storage {
            return Ok(());
        }
        let shared = match std::mem::replace(&mut self.storage, Storage::Owned(Vec::new())) {
            Storage::Shared(data) => data,
            Storage::Owned(data) => {
                self.storage = Storage::Owned(data);
                return Ok(());
            }
        };
        match Arc::try_unwrap(shared) {
            Ok(data) => {
                self.storage = Storage::Owned(data);
                Ok(())
            }
            Err(shared) => match try_clone(&shared) {
                Ok(data) => {
                    self.storage = Storage::Owned(data);
                    Ok(())
                }
                Err(err) => {
                    self.storage = Storage::Shared(shared);
                    Err(err)
                }
            },
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        match self.storage {
            Storage::Owned(data) => data,
            Storage::Shared(data) => Arc::try_unwrap(data).unwrap_or_else(|data| data.to_vec()),
        }
    }

    // ==========================================
    // 头部标记
    // ==========================================

    pub fn mac_header_offset(&self) -> Option<usize> {
        self.mac_header
    }

    pub fn set_mac_header(&mut self, offset: usize) {
        self.mac_header = Some(offset);
    }

    pub fn network_header(&self) -> Option<(usize, usize)> {
        self.network_header
    }

    pub fn network_header_offset(&self) -> Option<usize> {
        self.network_header.map(|(offset, _)| offset)
    }

    pub fn transport_header_offset(&self) -> Option<usize> {
        self.network_header.map(|(offset, len)| offset + len)
    }

    /// 标记网络层头部；声明的长度超出缓冲区时拒绝
    pub fn set_network_header(&mut self, offset: usize, len: usize) -> Result<(), FrameError> {
        self.range(offset, len)?;
        self.network_header = Some((offset, len));
        Ok(())
    }

    // ==========================================
    // 带边界检查的读写
    // ==========================================

    fn range(&self, offset: usize, len: usize) -> Result<Range<usize>, FrameError> {
        let frame_len = self.len();
        offset
            .checked_add(len)
            .filter(|&end| end <= frame_len)
            .map(|end| offset..end)
            .ok_or(FrameError::Truncated {
                offset,
                len,
                frame_len,
            })
    }

    pub fn bytes(&self, offset: usize, len: usize) -> Result<&[u8], FrameError> {
        let range = self.range(offset, len)?;
        Ok(&self.data()[range])
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, FrameError> {
        Ok(self.bytes(offset, 1)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, FrameError> {
        let b = self.bytes(offset, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn data_mut(&mut self) -> Result<&mut [u8], FrameError> {
        match &mut self.storage {
            Storage::Owned(data) => Ok(data.as_mut_slice()),
            Storage::Shared(_) => Err(FrameError::NotExclusive),
        }
    }

    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], FrameError> {
        let range = self.range(offset, len)?;
        Ok(&mut self.data_mut()?[range])
    }

    pub fn write_bytes(&mut self, offset: usize, src: &[u8]) -> Result<(), FrameError> {
        self.bytes_mut(offset, src.len())?.copy_from_slice(src);
        Ok(())
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), FrameError> {
        self.write_bytes(offset, &[value])
    }

    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), FrameError> {
        self.write_bytes(offset, &value.to_be_bytes())
    }

    /// 原地交换两段等长且不重叠的字节
    pub fn swap_ranges(&mut self, a: usize, b: usize, len: usize) -> Result<(), FrameError> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo = self.range(lo, len)?;
        let hi = self.range(hi, len)?;
        if lo.end > hi.start {
            return Err(FrameError::OverlappingRanges { a, b, len });
        }
        let data = self.data_mut()?;
        let (head, tail) = data.split_at_mut(hi.start);
        head[lo].swap_with_slice(&mut tail[..len]);
        Ok(())
    }
}

fn try_clone(src: &[u8]) -> Result<Vec<u8>, FrameError> {
    let mut data = Vec::new();
    data.try_reserve_exact(src.len())
        .map_err(|_| FrameError::CloneFailed { len: src.len() })?;
    data.extend_from_slice(src);
    Ok(data)
}

impl From<Vec<u8>> for Frame {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for Frame {
    fn from(value: &[u8]) -> Self {
        Self::new(value.to_vec())
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}
