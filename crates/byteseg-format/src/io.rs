//! 带缓冲的输入.
//!
//! 解封装器通过 [`IoContext`] 读取数据. 上下文内部有一块读缓冲区,
//! 因此"当前文件偏移"不是后端的读取位置, 而是后端位置减去缓冲区里尚未消耗的字节数,
//! 由 [`IoContext::position`] 统一计算.

use byteseg_core::{ByteSegError, ByteSegResult};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// 输入后端
///
/// 文件和内存缓冲区各有一个实现, 测试里可以注入会出错的后端.
pub trait IoBackend: Send {
    /// 读取数据, 返回 0 表示已到末尾
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 定位
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;
    /// 后端当前的读取位置
    fn position(&mut self) -> io::Result<u64>;
    /// 是否支持定位
    fn is_seekable(&self) -> bool;
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// 输入上下文, 持有底层句柄, 随上下文一起释放
pub struct IoContext {
    inner: Box<dyn IoBackend>,
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区中下一个待消耗字节的下标
    buf_pos: usize,
}

impl IoContext {
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self::with_buffer_size(backend, DEFAULT_BUFFER_SIZE)
    }

    /// 指定读缓冲区大小
    pub fn with_buffer_size(backend: Box<dyn IoBackend>, buffer_size: usize) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; buffer_size.max(1)],
            buf_len: 0,
            buf_pos: 0,
        }
    }

    /// 只读打开本地文件
    pub fn open_read(path: impl AsRef<Path>) -> ByteSegResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend { file })))
    }

    /// 填满 `buf`
    ///
    /// 被信号打断的读取自动重试. 其它错误返回前会退回到调用前的位置,
    /// 所以失败的读取不消耗任何字节, 调用方可以原样重试.
    /// 不足 `buf.len()` 字节就到了末尾时返回 `Eof`.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> ByteSegResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let n = buffered.min(buf.len() - filled);
                buf[filled..filled + n]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + n]);
                self.buf_pos += n;
                filled += n;
                continue;
            }

            self.buf_pos = 0;
            self.buf_len = 0;
            match self.inner.read(&mut self.buffer) {
                Ok(0) => return Err(ByteSegError::Eof),
                Ok(n) => self.buf_len = n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.rewind(filled)?;
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// 把已经从缓冲区拷走的 `consumed` 字节退回后端
    ///
    /// 只在缓冲区为空时调用, 此时后端位置正好在这些字节之后.
    fn rewind(&mut self, consumed: usize) -> ByteSegResult<()> {
        if consumed > 0 && self.inner.is_seekable() {
            self.inner.seek(SeekFrom::Current(-(consumed as i64)))?;
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> ByteSegResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// 最多读取 `count` 字节, 遇到末尾时返回已读部分
    pub fn read_up_to(&mut self, count: usize) -> ByteSegResult<Vec<u8>> {
        let mut out = Vec::with_capacity(count);
        let mut byte = [0u8; 1];
        while out.len() < count {
            match self.read_exact(&mut byte) {
                Ok(()) => out.push(byte[0]),
                Err(ByteSegError::Eof) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// 定位, 同时清空读缓冲区
    pub fn seek(&mut self, pos: SeekFrom) -> ByteSegResult<u64> {
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }

    /// 下一个待读字节在文件中的绝对偏移
    pub fn position(&mut self) -> ByteSegResult<u64> {
        let raw_pos = self.inner.position()?;
        let buffered = (self.buf_len - self.buf_pos) as u64;
        Ok(raw_pos - buffered)
    }

    pub(crate) fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }
}

struct FileBackend {
    file: std::fs::File,
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// 内存后端, 用于测试和基准
pub struct MemoryBackend {
    data: Vec<u8>,
    pos: usize,
}

impl MemoryBackend {
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.data.len().saturating_sub(self.pos));
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).unwrap_or(i64::MAX),
            SeekFrom::End(offset) => self.data.len() as i64 + offset,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = target as usize;
        Ok(self.pos as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }
}
