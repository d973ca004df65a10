//! # byteseg
//!
//! 为单个 MPEG-TS 文件生成按关键帧对齐的字节范围 HLS 点播列表.
//! 服务器只需提供一个物理文件, 客户端按列表中的字节范围分段拉取.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use byteseg::core::Rational;
//! use byteseg::hls::SegmenterConfig;
//!
//! let config = SegmenterConfig::new(250, Rational::new(25, 1)).unwrap();
//! let stdout = std::io::stdout();
//! let summary = byteseg::segment_file("movie.ts", &config, stdout.lock()).unwrap();
//! eprintln!("{} 个切片", summary.segments);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `byteseg-core` | 错误类型, 有理数, 媒体类型 |
//! | `byteseg-format` | I/O 抽象与 MPEG-TS 解封装器 |
//! | `byteseg-hls` | 流选择, 切片引擎, 播放列表输出 |

use std::io::Write;

use byteseg_core::ByteSegResult;
use byteseg_format::{FormatRegistry, IoContext};
use byteseg_hls::{DemuxerSource, RunSummary, SegmenterConfig};

/// 核心类型
pub use byteseg_core as core;

/// 容器格式与 I/O
pub use byteseg_format as format;

/// 切片与播放列表
pub use byteseg_hls as hls;

/// 获取 byteseg 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置容器格式的注册表
pub fn default_format_registry() -> FormatRegistry {
    let mut registry = FormatRegistry::new();
    byteseg_format::register_all(&mut registry);
    registry
}

/// 以 MPEG-TS 格式打开文件, 返回可供切片的数据源
pub fn open_mpegts(path: &str) -> ByteSegResult<DemuxerSource> {
    let registry = default_format_registry();
    let format_id = registry.find_demuxer("mpegts")?;
    let mut io = IoContext::open_read(path)?;
    let demuxer = registry.open_input_as(format_id, &mut io, Some(path))?;
    Ok(DemuxerSource::new(demuxer, io))
}

/// 为 `path` 生成播放列表, 列表中的 URI 就是 `path`
pub fn segment_file<W: Write>(
    path: &str,
    config: &SegmenterConfig,
    out: W,
) -> ByteSegResult<RunSummary> {
    let mut source = open_mpegts(path)?;
    byteseg_hls::write_playlist(&mut source, config, path, out)
}
