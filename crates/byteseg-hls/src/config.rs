//! 切片参数.

use byteseg_core::{ByteSegError, ByteSegResult, Rational};

/// 字节范围的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeStyle {
    /// 兼容旧工具的输出: 第一条长度为结束偏移减 1, 之后每条长度写累计结束偏移
    #[default]
    Legacy,
    /// 符合 HLS 语义: 第一条长度为结束偏移, 之后每条长度为与上一条结束偏移之差
    Strict,
}

/// 切片参数
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// 一个切片至少包含的视频帧数, 达到后在下一个关键帧处切分
    pub chunk_frames: u64,
    /// 视频帧率, 用于把帧数换算成整数秒
    pub framerate: Rational,
    /// 字节范围写法
    pub range_style: RangeStyle,
}

impl SegmenterConfig {
    /// 创建并校验参数
    pub fn new(chunk_frames: u64, framerate: Rational) -> ByteSegResult<Self> {
        if !framerate.is_positive() {
            return Err(ByteSegError::InvalidArgument(format!(
                "帧率必须大于 0, 实际为 {framerate}"
            )));
        }
        Ok(Self {
            chunk_frames,
            framerate,
            range_style: RangeStyle::default(),
        })
    }

    /// 设置字节范围写法
    pub fn with_range_style(mut self, range_style: RangeStyle) -> Self {
        self.range_style = range_style;
        self
    }

    /// `frames` 帧对应的整数秒数 (截断)
    pub fn duration_of(&self, frames: u64) -> u64 {
        self.framerate.whole_seconds(frames)
    }
}
