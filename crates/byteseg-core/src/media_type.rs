//! 媒体类型定义.
//!
//! 对标 FFmpeg 的 `AVMediaType`.

use std::fmt;

/// 媒体流类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// 视频流
    Video,
    /// 音频流
    Audio,
    /// 数据流 (私有数据、SCTE-35 等)
    Data,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "视频",
            Self::Audio => "音频",
            Self::Data => "数据",
        };
        write!(f, "{name}")
    }
}
