//! # byteseg-format
//!
//! byteseg 容器格式库, 提供带缓冲的 I/O 抽象和 MPEG-TS 解封装器.
//!
//! 解封装器只负责把容器拆成带流索引、关键帧标记和读取游标的数据包,
//! 不理解更上层的切片逻辑.

pub mod codec_id;
pub mod demuxer;
pub mod demuxers;
pub mod format_id;
pub mod io;
pub mod packet;
pub mod probe;
pub mod registry;
pub mod stream;

// 重导出常用类型
pub use codec_id::CodecId;
pub use demuxer::Demuxer;
pub use format_id::FormatId;
pub use io::IoContext;
pub use packet::Packet;
pub use probe::ProbeScore;
pub use registry::FormatRegistry;
pub use stream::{Discard, Stream};

/// 注册所有内置容器格式
pub fn register_all(registry: &mut FormatRegistry) {
    demuxers::register_all_demuxers(registry);
}
