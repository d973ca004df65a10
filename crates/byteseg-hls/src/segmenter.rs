//! 切片引擎.
//!
//! 只统计选中视频流的数据包. 自上一个切点以来的帧数达到阈值后,
//! 遇到的第一个关键帧就是新的切点, 切点偏移取数据源当前的读取位置.
//! 帧数够了但迟迟没有关键帧时切片会变长; 最后一个切点之后的帧不会成为切片.
//! 读取中途遇到 I/O 错误时停止读取, 已产生的切片照常保留.

use byteseg_core::{ByteSegResult, Rational};
use byteseg_format::Packet;
use log::{debug, error, trace, warn};

use crate::config::SegmenterConfig;
use crate::source::{PacketSource, ReadError};

/// 一个切片
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// 切片包含的视频帧数
    pub frame_count: u64,
    /// 时长 (整数秒, 截断)
    pub duration: u64,
    /// 切片在文件中的结束偏移 (绝对值)
    pub end_offset: u64,
    /// 是否为第一个切片 (从文件偏移 0 开始)
    pub is_first: bool,
}

/// 一次运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 读到的数据包总数
    pub packets: u64,
    /// 输出的切片数
    pub segments: u64,
    /// 视频帧总数
    pub video_frames: u64,
    /// 最后一个切点之后被丢弃的视频帧数
    pub dropped_frames: u64,
    /// 可重试错误次数
    pub transient_errors: u64,
    /// 最后一个切片的结束偏移
    pub last_end_offset: Option<u64>,
    /// 使读取提前结束的 I/O 错误
    pub read_error: Option<String>,
}

/// 切片引擎
#[derive(Debug)]
pub struct Segmenter {
    video_index: Option<usize>,
    chunk_frames: u64,
    framerate: Rational,
    /// 自上一个切点以来的视频帧数
    frames: u64,
    /// 是否已经产生过切点
    seen_boundary: bool,
}

impl Segmenter {
    /// 创建引擎, `video_index` 为 `None` 时不会产生任何切片
    pub fn new(video_index: Option<usize>, config: &SegmenterConfig) -> Self {
        Self {
            video_index,
            chunk_frames: config.chunk_frames,
            framerate: config.framerate,
            frames: 0,
            seen_boundary: false,
        }
    }

    /// 自上一个切点以来累计的视频帧数
    pub fn pending_frames(&self) -> u64 {
        self.frames
    }

    /// 处理一个数据包
    ///
    /// `position` 只在确认切点时调用一次, 返回切点的绝对文件偏移.
    pub fn on_packet(
        &mut self,
        packet: &Packet,
        position: impl FnOnce() -> u64,
    ) -> Option<Segment> {
        if self.video_index != Some(packet.stream_index) {
            return None;
        }

        self.frames += 1;
        if !packet.is_keyframe || self.frames < self.chunk_frames {
            return None;
        }

        let segment = Segment {
            frame_count: self.frames,
            duration: self.framerate.whole_seconds(self.frames),
            end_offset: position(),
            is_first: !self.seen_boundary,
        };
        self.seen_boundary = true;
        self.frames = 0;
        Some(segment)
    }

    /// 把数据源读完, 每得到一个切片就交给 `emit`
    ///
    /// 可重试错误会记录日志并继续读取. 不可恢复的 I/O 错误会停止读取,
    /// 记入 [`RunSummary::read_error`] 后正常返回. 只有 `emit` 的错误会向上返回.
    pub fn run<S, F>(&mut self, source: &mut S, mut emit: F) -> ByteSegResult<RunSummary>
    where
        S: PacketSource + ?Sized,
        F: FnMut(&Segment) -> ByteSegResult<()>,
    {
        let mut summary = RunSummary::default();
        loop {
            let packet = match source.read_packet() {
                Ok(packet) => packet,
                Err(ReadError::EndOfStream) => break,
                Err(ReadError::Transient(e)) => {
                    summary.transient_errors += 1;
                    warn!("读取数据包失败, 重试: {e}");
                    continue;
                }
                Err(ReadError::FatalIo(e)) => {
                    error!("读取数据包时发生 I/O 错误, 停止读取: {e}");
                    summary.read_error = Some(e.to_string());
                    break;
                }
            };

            summary.packets += 1;
            if self.video_index == Some(packet.stream_index) {
                summary.video_frames += 1;
            }

            if let Some(segment) = self.on_packet(&packet, || source.position()) {
                debug!(
                    "切点: {} 帧, {} 秒, 结束偏移 {}",
                    segment.frame_count, segment.duration, segment.end_offset
                );
                emit(&segment)?;
                summary.segments += 1;
                summary.last_end_offset = Some(segment.end_offset);
            } else {
                trace!(
                    "流 #{} 包, 关键帧={}, 起始={}, 游标={}",
                    packet.stream_index, packet.is_keyframe, packet.pos, packet.read_pos
                );
            }
        }

        summary.dropped_frames = self.frames;
        if self.frames > 0 {
            debug!("末尾 {} 帧不足一个切片, 已丢弃", self.frames);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_frames: u64, fps: i32) -> SegmenterConfig {
        SegmenterConfig::new(chunk_frames, Rational::from(fps)).unwrap()
    }

    fn video(is_keyframe: bool) -> Packet {
        let mut pkt = Packet::from_data(vec![0u8; 4]);
        pkt.stream_index = 0;
        pkt.is_keyframe = is_keyframe;
        pkt
    }

    #[test]
    fn test_阈值之前的关键帧不切分() {
        let mut seg = Segmenter::new(Some(0), &config(3, 1));
        assert_eq!(seg.on_packet(&video(true), || 10), None);
        assert_eq!(seg.on_packet(&video(true), || 20), None);
        let s = seg.on_packet(&video(true), || 30).unwrap();
        assert_eq!(s.frame_count, 3);
        assert_eq!(s.end_offset, 30);
        assert!(s.is_first);
        assert_eq!(seg.pending_frames(), 0);
    }

    #[test]
    fn test_达到阈值后等待关键帧() {
        let mut seg = Segmenter::new(Some(0), &config(2, 1));
        assert_eq!(seg.on_packet(&video(true), || 0), None);
        assert_eq!(seg.on_packet(&video(false), || 0), None);
        assert_eq!(seg.on_packet(&video(false), || 0), None);
        let s = seg.on_packet(&video(true), || 99).unwrap();
        assert_eq!(s.frame_count, 4);

        // 第二个切片不再是第一个
        seg.on_packet(&video(false), || 0);
        let s = seg.on_packet(&video(true), || 150).unwrap();
        assert!(!s.is_first);
        assert_eq!(s.frame_count, 2);
    }

    #[test]
    fn test_只在切点查询偏移() {
        let mut seg = Segmenter::new(Some(0), &config(5, 1));
        for _ in 0..4 {
            seg.on_packet(&video(true), || panic!("未到切点不应查询偏移"));
        }
    }

    #[test]
    fn test_忽略非视频流() {
        let mut seg = Segmenter::new(Some(1), &config(1, 1));
        assert_eq!(seg.on_packet(&video(true), || 0), None);
        assert_eq!(seg.pending_frames(), 0);

        let mut none = Segmenter::new(None, &config(0, 1));
        assert_eq!(none.on_packet(&video(true), || 0), None);
    }

    #[test]
    fn test_时长截断取整() {
        let mut seg = Segmenter::new(Some(0), &config(29, 10));
        for _ in 0..28 {
            seg.on_packet(&video(false), || 0);
        }
        let s = seg.on_packet(&video(true), || 1).unwrap();
        assert_eq!(s.frame_count, 29);
        assert_eq!(s.duration, 2);
    }

    #[test]
    fn test_阈值为零时每个关键帧都切分() {
        let mut seg = Segmenter::new(Some(0), &config(0, 1));
        assert_eq!(seg.on_packet(&video(true), || 5).unwrap().frame_count, 1);
        assert_eq!(seg.on_packet(&video(false), || 6), None);
        assert_eq!(seg.on_packet(&video(true), || 7).unwrap().frame_count, 2);
    }
}
