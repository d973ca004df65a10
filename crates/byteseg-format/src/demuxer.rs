//! 解封装器 (Demuxer) trait 定义.
//!
//! 对标 FFmpeg 的 `AVInputFormat`, 定义了从容器格式中读取数据包的接口.

use byteseg_core::ByteSegResult;

use crate::io::IoContext;
use crate::packet::Packet;
use crate::stream::{Discard, Stream};

/// 解封装器 trait
///
/// 使用流程:
/// 1. 调用 `open()` 打开容器并解析头部
/// 2. 调用 `streams()` 获取流信息, 用 `set_discard()` 关闭不需要的流
/// 3. 循环调用 `read_packet()` 读取数据包, 直到 `ByteSegError::Eof`
pub trait Demuxer: Send {
    /// 获取格式名称
    fn name(&self) -> &str;

    /// 设置打开时为解析头部最多预读的容器包数
    ///
    /// 不需要预读的格式可以忽略.
    fn set_probe_packets(&mut self, _packets: usize) {}

    /// 打开容器并解析头部信息
    fn open(&mut self, io: &mut IoContext) -> ByteSegResult<()>;

    /// 获取所有流信息
    fn streams(&self) -> &[Stream];

    /// 设置流的丢弃策略
    ///
    /// 被丢弃的流不再产出数据包.
    fn set_discard(&mut self, stream_index: usize, discard: Discard) -> ByteSegResult<()>;

    /// 读取下一个数据包
    ///
    /// 返回包的 `read_pos` 为产出该包时 `io.position()` 的值.
    ///
    /// # 返回
    /// - `Ok(packet)`: 成功读取一个数据包
    /// - `Err(ByteSegError::Eof)`: 已到达文件末尾
    fn read_packet(&mut self, io: &mut IoContext) -> ByteSegResult<Packet>;
}
