//! 流信息定义.
//!
//! 对标 FFmpeg 的 `AVStream`, 描述容器中的一条基本流.

use byteseg_core::MediaType;

use crate::codec_id::CodecId;

/// 流丢弃策略
///
/// 对标 FFmpeg 的 `AVDiscard`, 这里只需要两档.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discard {
    /// 正常输出数据包
    #[default]
    None,
    /// 丢弃该流的全部数据包
    All,
}

/// 流信息
#[derive(Debug, Clone)]
pub struct Stream {
    /// 流索引 (在容器中的位置, 从 0 开始)
    pub index: usize,
    /// 媒体类型
    pub media_type: MediaType,
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 容器内的标识 (MPEG-TS 中为 PID)
    pub id: u32,
    /// 容器内的原始流类型 (MPEG-TS 中为 stream_type)
    pub stream_type: u8,
    /// 丢弃策略
    pub discard: Discard,
}

impl Stream {
    /// 是否输出该流的数据包
    pub fn is_active(&self) -> bool {
        self.discard == Discard::None
    }
}
