//! 编解码器标识符.
//!
//! 只覆盖 MPEG-TS PMT 中常见的 stream_type.

use byteseg_core::MediaType;
use std::fmt;

/// 编解码器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// 未知或私有数据
    None,

    // 视频
    /// MPEG-1 Video
    Mpeg1Video,
    /// MPEG-2 Video
    Mpeg2Video,
    /// MPEG-4 Part 2
    Mpeg4,
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,

    // 音频
    /// MPEG Audio Layer III (以及 Layer I/II)
    Mp3,
    /// AAC (ADTS / LATM)
    Aac,
    /// AC-3
    Ac3,
    /// E-AC-3
    Eac3,
    /// DTS
    Dts,
}

impl CodecId {
    /// 获取编解码器对应的媒体类型
    pub const fn media_type(&self) -> MediaType {
        match self {
            Self::None => MediaType::Data,
            Self::Mpeg1Video | Self::Mpeg2Video | Self::Mpeg4 | Self::H264 | Self::H265 => {
                MediaType::Video
            }
            Self::Mp3 | Self::Aac | Self::Ac3 | Self::Eac3 | Self::Dts => MediaType::Audio,
        }
    }

    /// 获取编解码器名称 (与 FFmpeg 命名一致)
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mpeg1Video => "mpeg1video",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg4 => "mpeg4",
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Ac3 => "ac3",
            Self::Eac3 => "eac3",
            Self::Dts => "dts",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
