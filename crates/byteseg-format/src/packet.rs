//! 压缩数据包 (Packet).
//!
//! 对标 FFmpeg 的 `AVPacket`, 这里只保留切片需要的字段.

use bytes::Bytes;

/// 压缩数据包
#[derive(Debug, Clone, Default)]
pub struct Packet {
    /// 压缩数据
    pub data: Bytes,
    /// 所属流的索引
    pub stream_index: usize,
    /// 是否为关键帧 (随机访问点)
    pub is_keyframe: bool,
    /// 该包第一个字节所在容器包的起始偏移
    pub pos: u64,
    /// 产出该包时的读取游标: 下一个待读字节在文件中的绝对偏移
    pub read_pos: u64,
}

impl Packet {
    /// 从数据创建数据包
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }
}
