//! 字节范围 HLS 点播列表输出.
//!
//! 列表头部要等到第一个切片才写出, 因为 `#EXT-X-TARGETDURATION` 取第一个切片的时长.
//! 每条记录写完即输出, 只追加不回改.
//!
//! ```text
//! #EXTM3U
//! #EXT-X-PLAYLIST-TYPE:VOD
//! #EXT-X-TARGETDURATION:3
//! #EXT-X-VERSION:4
//! #EXT-X-MEDIA-SEQUENCE:0
//! #EXTINF:3,
//! #EXT-X-BYTERANGE:56399@0
//! movie.ts
//! #EXTINF:3,
//! #EXT-X-BYTERANGE:112800
//! movie.ts
//! #EXT-X-ENDLIST
//! ```

use std::io::{self, Write};

use crate::config::RangeStyle;
use crate::segmenter::Segment;

/// 协议版本 (`EXT-X-BYTERANGE` 需要 4)
const HLS_VERSION: u32 = 4;

/// 流式播放列表写入器
pub struct PlaylistWriter<W: Write> {
    out: W,
    uri: String,
    range_style: RangeStyle,
    header_written: bool,
    /// 上一个切片的结束偏移
    prev_end: u64,
}

impl<W: Write> PlaylistWriter<W> {
    /// 创建写入器, 每条记录引用 `uri`
    pub fn new(out: W, uri: impl Into<String>, range_style: RangeStyle) -> Self {
        Self {
            out,
            uri: uri.into(),
            range_style,
            header_written: false,
            prev_end: 0,
        }
    }

    fn write_header(&mut self, target_duration: u64) -> io::Result<()> {
        writeln!(self.out, "#EXTM3U")?;
        writeln!(self.out, "#EXT-X-PLAYLIST-TYPE:VOD")?;
        writeln!(self.out, "#EXT-X-TARGETDURATION:{target_duration}")?;
        writeln!(self.out, "#EXT-X-VERSION:{HLS_VERSION}")?;
        writeln!(self.out, "#EXT-X-MEDIA-SEQUENCE:0")?;
        self.header_written = true;
        Ok(())
    }

    /// 写出一个切片
    ///
    /// 写出的第一条记录之前先写列表头部.
    /// 标记为 [`Segment::is_first`] 的切片带 `@0` 起点, 其余切片与前一个相邻.
    pub fn write_segment(&mut self, segment: &Segment) -> io::Result<()> {
        if !self.header_written {
            self.write_header(segment.duration)?;
        }

        writeln!(self.out, "#EXTINF:{},", segment.duration)?;
        match (self.range_style, segment.is_first) {
            // 旧工具把第一个切片写成比已读字节少 1
            (RangeStyle::Legacy, true) => writeln!(
                self.out,
                "#EXT-X-BYTERANGE:{}@0",
                segment.end_offset.saturating_sub(1)
            )?,
            (RangeStyle::Legacy, false) => {
                writeln!(self.out, "#EXT-X-BYTERANGE:{}", segment.end_offset)?
            }
            (RangeStyle::Strict, true) => {
                writeln!(self.out, "#EXT-X-BYTERANGE:{}@0", segment.end_offset)?
            }
            (RangeStyle::Strict, false) => writeln!(
                self.out,
                "#EXT-X-BYTERANGE:{}",
                segment.end_offset.saturating_sub(self.prev_end)
            )?,
        }
        writeln!(self.out, "{}", self.uri)?;

        self.prev_end = segment.end_offset;
        Ok(())
    }

    /// 写出结束标记并刷新, 返回底层写入器
    ///
    /// 一个切片都没有时先补一个最小头部, 保证输出始终是合法的播放列表.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.header_written {
            self.write_header(0)?;
        }
        writeln!(self.out, "#EXT-X-ENDLIST")?;
        self.out.flush()?;
        Ok(self.out)
    }
}
