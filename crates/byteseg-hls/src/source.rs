//! 数据包来源抽象.
//!
//! 切片引擎只通过 [`PacketSource`] 访问解封装器: 枚举流、丢弃流、逐个拉取数据包,
//! 以及查询最近一次读取完成后的文件偏移. 读取错误在这一层一次性归类为 [`ReadError`].

use std::io::ErrorKind;

use byteseg_core::{ByteSegError, ByteSegResult};
use byteseg_format::{Demuxer, Discard, IoContext, Packet, Stream};

/// 读取数据包失败的分类
#[derive(Debug)]
pub enum ReadError {
    /// 可重试的错误 (资源暂不可用、损坏的容器包等), 不消耗数据包
    Transient(ByteSegError),
    /// 底层 I/O 失败, 停止读取
    FatalIo(ByteSegError),
    /// 数据源已读完
    EndOfStream,
}

impl From<ByteSegError> for ReadError {
    fn from(err: ByteSegError) -> Self {
        match err {
            ByteSegError::Eof => Self::EndOfStream,
            ByteSegError::Io(ref e)
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) =>
            {
                Self::Transient(err)
            }
            ByteSegError::Io(_) => Self::FatalIo(err),
            other => Self::Transient(other),
        }
    }
}

/// 拉取式数据包来源
pub trait PacketSource {
    /// 容器中的全部流
    fn streams(&self) -> &[Stream];

    /// 设置流的丢弃策略
    fn set_discard(&mut self, stream_index: usize, discard: Discard) -> ByteSegResult<()>;

    /// 读取下一个数据包
    fn read_packet(&mut self) -> Result<Packet, ReadError>;

    /// 最近一次读取完成后的绝对文件偏移
    ///
    /// 即底层读取位置减去已缓冲但尚未消耗的字节数.
    fn position(&self) -> u64;
}

/// 把 `Demuxer` + `IoContext` 适配为 [`PacketSource`]
///
/// 持有打开的文件句柄, 随本值一起释放.
pub struct DemuxerSource {
    demuxer: Box<dyn Demuxer>,
    io: IoContext,
    position: u64,
}

impl DemuxerSource {
    /// 用已经 `open()` 过的解封装器创建
    pub fn new(demuxer: Box<dyn Demuxer>, io: IoContext) -> Self {
        Self {
            demuxer,
            io,
            position: 0,
        }
    }

    /// 解封装器名称
    pub fn format_name(&self) -> &str {
        self.demuxer.name()
    }
}

impl PacketSource for DemuxerSource {
    fn streams(&self) -> &[Stream] {
        self.demuxer.streams()
    }

    fn set_discard(&mut self, stream_index: usize, discard: Discard) -> ByteSegResult<()> {
        self.demuxer.set_discard(stream_index, discard)
    }

    fn read_packet(&mut self) -> Result<Packet, ReadError> {
        let pkt = self.demuxer.read_packet(&mut self.io)?;
        self.position = pkt.read_pos;
        Ok(pkt)
    }

    fn position(&self) -> u64 {
        self.position
    }
}
