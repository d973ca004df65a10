//! 容器格式注册表.
//!
//! 每种格式登记一个解封装器工厂和一个探测器, 支持按名称查找,
//! 以及在打开前确认输入确实是期望的格式.

use std::collections::HashMap;

use byteseg_core::{ByteSegError, ByteSegResult};

use crate::demuxer::Demuxer;
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeScore};

/// 解封装器工厂函数类型
pub type DemuxerFactory = fn() -> ByteSegResult<Box<dyn Demuxer>>;

/// 探测时读取的文件头部字节数
const PROBE_SIZE: usize = 8192;

/// 注册条目
struct FormatEntry {
    factory: DemuxerFactory,
    detector: Box<dyn FormatProbe + Send>,
}

/// 容器格式注册表
#[derive(Default)]
pub struct FormatRegistry {
    formats: HashMap<FormatId, FormatEntry>,
}

impl FormatRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一种格式
    pub fn register(
        &mut self,
        format_id: FormatId,
        factory: DemuxerFactory,
        detector: Box<dyn FormatProbe + Send>,
    ) {
        self.formats
            .insert(format_id, FormatEntry { factory, detector });
    }

    fn entry(&self, format_id: FormatId) -> ByteSegResult<&FormatEntry> {
        self.formats.get(&format_id).ok_or_else(|| {
            ByteSegError::FormatNotFound(format!("未找到 {format_id} 的解封装器"))
        })
    }

    /// 创建指定格式的解封装器实例
    pub fn create_demuxer(&self, format_id: FormatId) -> ByteSegResult<Box<dyn Demuxer>> {
        (self.entry(format_id)?.factory)()
    }

    /// 按名称查找已注册的格式 (如 "mpegts")
    pub fn find_demuxer(&self, name: &str) -> ByteSegResult<FormatId> {
        FormatId::from_name(name)
            .filter(|id| self.formats.contains_key(id))
            .ok_or_else(|| ByteSegError::FormatNotFound(format!("未找到名为 {name} 的解封装器")))
    }

    /// 确认输入是指定格式, 返回置信度
    ///
    /// 读取文件头部交给该格式的探测器判断, 然后 seek 回起始位置.
    pub fn probe_input(
        &self,
        format_id: FormatId,
        io: &mut IoContext,
        filename: Option<&str>,
    ) -> ByteSegResult<ProbeScore> {
        let entry = self.entry(format_id)?;
        let head = io.read_up_to(PROBE_SIZE)?;
        let score = entry.detector.probe(&head, filename).ok_or_else(|| {
            ByteSegError::FormatNotFound(format!("输入不是 {format_id} 格式"))
        })?;

        io.seek(std::io::SeekFrom::Start(0))?;
        Ok(score)
    }

    /// 以指定格式打开输入
    ///
    /// 先确认格式, 再创建解封装器并调用 `open()` 解析头部.
    pub fn open_input_as(
        &self,
        format_id: FormatId,
        io: &mut IoContext,
        filename: Option<&str>,
    ) -> ByteSegResult<Box<dyn Demuxer>> {
        self.probe_input(format_id, io, filename)?;
        let mut demuxer = self.create_demuxer(format_id)?;
        demuxer.open(io)?;
        Ok(demuxer)
    }
}
