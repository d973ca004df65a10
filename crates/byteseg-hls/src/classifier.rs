//! 流选择.
//!
//! 在容器报告的流中选出第一条视频流和第一条音频流, 其余全部丢弃.

use byteseg_core::{ByteSegResult, MediaType};
use byteseg_format::{Discard, Stream};
use log::{debug, info};

use crate::source::PacketSource;

/// 流选择结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamSelection {
    /// 选中的视频流索引
    pub video: Option<usize>,
    /// 选中的音频流索引
    pub audio: Option<usize>,
    /// 需要丢弃的流索引
    pub discarded: Vec<usize>,
}

/// 按流的顺序选出第一条视频流和第一条音频流
///
/// 纯函数, 对同一组流多次调用结果相同.
pub fn classify(streams: &[Stream]) -> StreamSelection {
    let mut selection = StreamSelection::default();
    for stream in streams {
        match stream.media_type {
            MediaType::Video if selection.video.is_none() => selection.video = Some(stream.index),
            MediaType::Audio if selection.audio.is_none() => selection.audio = Some(stream.index),
            _ => selection.discarded.push(stream.index),
        }
    }
    selection
}

impl StreamSelection {
    /// 流是否被选中
    pub fn is_selected(&self, stream_index: usize) -> bool {
        self.video == Some(stream_index) || self.audio == Some(stream_index)
    }

    /// 把选择结果应用到数据源
    pub fn apply<S: PacketSource + ?Sized>(&self, source: &mut S) -> ByteSegResult<()> {
        for index in self.video.iter().chain(self.audio.iter()) {
            source.set_discard(*index, Discard::None)?;
        }
        for &index in &self.discarded {
            if let Some(stream) = source.streams().get(index) {
                info!(
                    "丢弃流 #{index}: {} ({}, stream_type=0x{:02X})",
                    stream.media_type, stream.codec_id, stream.stream_type
                );
            }
            source.set_discard(index, Discard::All)?;
        }
        debug!(
            "选中视频流 {:?}, 音频流 {:?}",
            self.video, self.audio
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteseg_format::CodecId;

    fn stream(index: usize, codec_id: CodecId) -> Stream {
        Stream {
            index,
            media_type: codec_id.media_type(),
            codec_id,
            id: 0x100 + index as u32,
            stream_type: 0,
            discard: Discard::None,
        }
    }

    #[test]
    fn test_选出第一条视频和音频() {
        let streams = vec![
            stream(0, CodecId::None),
            stream(1, CodecId::Aac),
            stream(2, CodecId::H264),
            stream(3, CodecId::H265),
            stream(4, CodecId::Ac3),
        ];
        let selection = classify(&streams);
        assert_eq!(selection.video, Some(2));
        assert_eq!(selection.audio, Some(1));
        assert_eq!(selection.discarded, vec![0, 3, 4]);
        assert!(selection.is_selected(1));
        assert!(!selection.is_selected(3));
    }

    #[test]
    fn test_选择结果幂等() {
        let streams = vec![
            stream(0, CodecId::Mp3),
            stream(1, CodecId::Mpeg2Video),
            stream(2, CodecId::Mp3),
        ];
        assert_eq!(classify(&streams), classify(&streams));
    }

    #[test]
    fn test_没有流() {
        let selection = classify(&[]);
        assert_eq!(selection, StreamSelection::default());
    }

    #[test]
    fn test_只有音频() {
        let selection = classify(&[stream(0, CodecId::Aac)]);
        assert_eq!(selection.video, None);
        assert_eq!(selection.audio, Some(0));
        assert!(selection.discarded.is_empty());
    }
}
