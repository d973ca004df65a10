//! 端到端测试: 合成 TS 文件 → 解封装 → 切片 → 播放列表文本

mod common;

use byteseg::core::{ByteSegError, Rational};
use byteseg::hls::{RangeStyle, SegmenterConfig};

use common::{STREAM_TYPE_AAC, STREAM_TYPE_H264, TS_PACKET_SIZE, TsBuilder, write_temp_ts};

const V1: u16 = 0x101;
const V2: u16 = 0x102;
const V3: u16 = 0x103;
const A1: u16 = 0x104;

/// 3 条视频流交织, 每条都是 关键帧,P,P,P 循环, 共 100 轮
fn three_video_streams() -> Vec<u8> {
    let mut ts = TsBuilder::new(&[
        (STREAM_TYPE_H264, V1),
        (STREAM_TYPE_H264, V2),
        (STREAM_TYPE_H264, V3),
    ]);
    for t in 0..100 {
        let key = t % 4 == 0;
        ts.video(V1, key).video(V2, key).video(V3, key);
    }
    ts.build()
}

fn run(data: &[u8], chunk_frames: u64, fps: i32, style: RangeStyle) -> (String, String, byteseg::hls::RunSummary) {
    common::init_logger();
    let file = write_temp_ts(data);
    let path = file.path().to_string_lossy().into_owned();
    let config = SegmenterConfig::new(chunk_frames, Rational::new(fps, 1))
        .unwrap()
        .with_range_style(style);
    let mut out = Vec::new();
    let summary = byteseg::segment_file(&path, &config, &mut out).unwrap();
    (String::from_utf8(out).unwrap(), path, summary)
}

#[test]
fn test_三条视频流交织() {
    let (text, uri, summary) = run(&three_video_streams(), 30, 10, RangeStyle::Legacy);

    // 第 t 轮第一条视频流的包在第 t+1 轮读完后产出, 游标为 (3t + 6) * 188.
    // 切点: t=32 (33 帧), t=64 (32 帧), t=96 (32 帧)
    let expected = format!(
        "#EXTM3U
#EXT-X-PLAYLIST-TYPE:VOD
#EXT-X-TARGETDURATION:3
#EXT-X-VERSION:4
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:3,
#EXT-X-BYTERANGE:19175@0
{uri}
#EXTINF:3,
#EXT-X-BYTERANGE:37224
{uri}
#EXTINF:3,
#EXT-X-BYTERANGE:55272
{uri}
#EXT-X-ENDLIST
"
    );
    assert_eq!(text, expected);

    assert_eq!(summary.segments, 3);
    assert_eq!(summary.video_frames, 100, "只统计第一条视频流");
    assert_eq!(summary.dropped_frames, 3, "末尾 3 帧不足一个切片");
    assert_eq!(summary.last_end_offset, Some(55272));
    assert_eq!(summary.transient_errors, 0);
}

#[test]
fn test_严格字节范围() {
    let (text, _, _) = run(&three_video_streams(), 30, 10, RangeStyle::Strict);
    let ranges: Vec<&str> = text
        .lines()
        .filter_map(|l| l.strip_prefix("#EXT-X-BYTERANGE:"))
        .collect();
    assert_eq!(ranges, ["19176@0", "18048", "18048"]);
}

#[test]
fn test_音频不计入帧数() {
    let mut ts = TsBuilder::new(&[(STREAM_TYPE_H264, V1), (STREAM_TYPE_AAC, A1)]);
    for t in 0..25 {
        ts.video(V1, t % 5 == 0).audio(A1);
    }
    let (text, _, summary) = run(&ts.build(), 10, 5, RangeStyle::Strict);

    // 视频包在 2 + 2t, 下一个视频 PUSI 读完后游标为 (2t + 5) * 188
    let p = TS_PACKET_SIZE as u64;
    let ranges: Vec<String> = text
        .lines()
        .filter_map(|l| l.strip_prefix("#EXT-X-BYTERANGE:"))
        .map(str::to_string)
        .collect();
    assert_eq!(ranges, [format!("{}@0", 25 * p), format!("{}", 20 * p)]);
    assert_eq!(summary.packets, 50, "音频包照常读取");
    assert_eq!(summary.video_frames, 25);
    assert!(text.contains("#EXTINF:2,"));
}

#[test]
fn test_没有任何流() {
    let ts = TsBuilder::new(&[]);
    let (text, _, summary) = run(&ts.build(), 30, 25, RangeStyle::Legacy);
    assert_eq!(
        text,
        "#EXTM3U\n#EXT-X-PLAYLIST-TYPE:VOD\n#EXT-X-TARGETDURATION:0\n#EXT-X-VERSION:4\n#EXT-X-MEDIA-SEQUENCE:0\n#EXT-X-ENDLIST\n"
    );
    assert_eq!(summary.segments, 0);
    assert_eq!(summary.packets, 0);
}

#[test]
fn test_只有音频() {
    let mut ts = TsBuilder::new(&[(STREAM_TYPE_AAC, A1)]);
    for _ in 0..40 {
        ts.audio(A1);
    }
    let (text, _, summary) = run(&ts.build(), 1, 25, RangeStyle::Legacy);
    assert!(!text.contains("#EXTINF"));
    assert!(text.ends_with("#EXT-X-ENDLIST\n"));
    assert_eq!(summary.video_frames, 0);
    assert_eq!(summary.packets, 40);
}

#[test]
fn test_损坏数据后继续切片() {
    let mut ts = TsBuilder::new(&[(STREAM_TYPE_H264, V1)]);
    for t in 0..20 {
        ts.video(V1, t % 2 == 0);
    }
    ts.garbage(TS_PACKET_SIZE);
    for t in 20..40 {
        ts.video(V1, t % 2 == 0);
    }
    let data = ts.build();
    let (text, _, summary) = run(&data, 4, 2, RangeStyle::Strict);

    assert!(summary.transient_errors >= 1);
    assert!(summary.segments >= 8);
    let last = summary.last_end_offset.unwrap();
    assert!(last <= data.len() as u64);

    // 严格格式下各段长度之和等于最后一个切点
    let total: u64 = text
        .lines()
        .filter_map(|l| l.strip_prefix("#EXT-X-BYTERANGE:"))
        .map(|r| r.trim_end_matches("@0").parse::<u64>().unwrap())
        .sum();
    assert_eq!(total, last);
}

#[test]
fn test_非_ts_文件() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    std::io::Write::write_all(&mut file, b"#EXTM3U\nnot a transport stream\n").unwrap();
    let path = file.path().to_string_lossy().into_owned();
    assert!(matches!(
        byteseg::open_mpegts(&path),
        Err(ByteSegError::FormatNotFound(_))
    ));
}

#[test]
fn test_文件不存在() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.ts");
    let err = byteseg::open_mpegts(&path.to_string_lossy()).err().unwrap();
    assert!(err.is_io());
}
