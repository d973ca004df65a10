//! # byteseg-hls
//!
//! 把一个 MPEG-TS 文件描述成按关键帧对齐的字节范围 HLS 点播列表,
//! 不需要真正切分文件.
//!
//! 处理流程是单遍的:
//! 1. [`classify`] 选出第一条视频流和第一条音频流, 其余流交给数据源丢弃
//! 2. [`Segmenter`] 消费数据包, 统计视频帧数, 在达到阈值后的第一个关键帧处切分
//! 3. [`PlaylistWriter`] 每得到一个切片就立即输出一条记录

pub mod classifier;
pub mod config;
pub mod playlist;
pub mod segmenter;
pub mod source;

pub use classifier::{StreamSelection, classify};
pub use config::{RangeStyle, SegmenterConfig};
pub use playlist::PlaylistWriter;
pub use segmenter::{RunSummary, Segment, Segmenter};
pub use source::{DemuxerSource, PacketSource, ReadError};

use std::io::Write;

use byteseg_core::ByteSegResult;
use log::{info, warn};

/// 从数据源生成完整的播放列表并写入 `out`
///
/// `uri` 是每条记录引用的文件名 (通常就是输入路径).
/// 切片一产生就写出, 不在内存中保留列表.
/// 读取中途的 I/O 错误不会让列表缺少结束标记, 错误记录在返回的统计里.
pub fn write_playlist<S, W>(
    source: &mut S,
    config: &SegmenterConfig,
    uri: &str,
    out: W,
) -> ByteSegResult<RunSummary>
where
    S: PacketSource + ?Sized,
    W: Write,
{
    let selection = classify(source.streams());
    selection.apply(source)?;
    if selection.video.is_none() {
        warn!("没有找到视频流, 不会产生任何切片");
    }

    let mut writer = PlaylistWriter::new(out, uri, config.range_style);
    let mut segmenter = Segmenter::new(selection.video, config);
    let summary = segmenter.run(source, |segment| {
        writer.write_segment(segment)?;
        Ok(())
    })?;
    writer.finish()?;

    if let Some(e) = &summary.read_error {
        warn!("输入未读完即结束: {e}");
    }
    info!(
        "完成: {} 个切片, {} 个视频帧, 丢弃末尾 {} 帧, {} 次可重试错误",
        summary.segments, summary.video_frames, summary.dropped_frames, summary.transient_errors
    );
    Ok(summary)
}
