//! MPEG-TS (Transport Stream) 解封装器.
//!
//! MPEG-TS 是一种基于固定大小 (188 字节) 包的传输流格式,
//! 广泛用于数字广播 (DVB/ATSC) 和 HLS 流媒体.
//!
//! # TS 包结构 (188 字节)
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ 同步字节 (0x47)                    1 byte│
//! │ TEI(1) + PUSI(1) + Priority(1) +         │
//! │   PID(13)                         2 bytes│
//! │ TSC(2) + AFC(2) + CC(4)          1 byte │
//! │ [Adaptation Field]               可变     │
//! │ [Payload]                        可变     │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # 关键 PID
//! - PID 0x0000: PAT (Program Association Table)
//! - PID 0x1FFF: Null packet (填充)
//!
//! # 读取游标
//! 一个 PES 要等到同 PID 的下一个 PUSI 包 (或文件末尾) 才能确定结束,
//! 因此每个输出包的 `read_pos` 是读完触发刷新的那个 TS 包之后的文件偏移.

use bytes::Bytes;
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};

use byteseg_core::{ByteSegError, ByteSegResult};

use crate::codec_id::CodecId;
use crate::demuxer::Demuxer;
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::packet::Packet;
use crate::probe::{self, FormatProbe, ProbeScore};
use crate::stream::{Discard, Stream};

/// TS 包大小
const TS_PACKET_SIZE: usize = 188;
/// TS 同步字节
const TS_SYNC_BYTE: u8 = 0x47;
/// PAT PID
const PID_PAT: u16 = 0x0000;
/// 空包 PID
const PID_NULL: u16 = 0x1FFF;
/// 同步搜索的最大字节数
const MAX_SYNC_SEARCH: usize = 65536;
/// 打开时为寻找 PAT/PMT 默认预读的 TS 包数
pub const DEFAULT_PROBE_PACKETS: usize = 2000;

/// MPEG-TS stream_type → CodecId 映射
fn stream_type_to_codec(stream_type: u8) -> CodecId {
    match stream_type {
        // 视频
        0x01 => CodecId::Mpeg1Video,
        0x02 => CodecId::Mpeg2Video,
        0x10 => CodecId::Mpeg4,
        0x1B => CodecId::H264,
        0x24 => CodecId::H265,
        // 音频
        0x03 | 0x04 => CodecId::Mp3,
        0x0F => CodecId::Aac,  // ADTS
        0x11 => CodecId::Aac,  // LATM
        0x81 => CodecId::Ac3,  // ATSC AC-3
        0x87 => CodecId::Eac3, // ATSC E-AC-3
        0x82 | 0x86 => CodecId::Dts,
        // 0x06 私有数据 (字幕、SCTE-35 等) 以及其它类型
        _ => CodecId::None,
    }
}

/// PES (Packetized Elementary Stream) 重组缓冲区
struct PesBuffer {
    /// 缓冲数据
    data: Vec<u8>,
    /// 是否为随机访问点 (关键帧)
    random_access: bool,
    /// PES 第一个 TS 包的文件偏移, 还没见到起始包时为 None
    start_pos: Option<u64>,
    /// 对应的流索引
    stream_index: usize,
}

impl PesBuffer {
    fn new(stream_index: usize) -> Self {
        Self {
            data: Vec::new(),
            random_access: false,
            start_pos: None,
            stream_index,
        }
    }

    fn clear(&mut self) {
        self.data.clear();
        self.random_access = false;
        self.start_pos = None;
    }
}

/// MPEG-TS 解封装器
pub struct TsDemuxer {
    /// 流信息
    streams: Vec<Stream>,
    /// PMT PID (从 PAT 获取)
    pmt_pid: u16,
    /// PID → 流索引映射
    pid_to_stream: HashMap<u16, usize>,
    /// PID → PES 缓冲区
    pes_buffers: HashMap<u16, PesBuffer>,
    /// 已完成的数据包队列
    packet_queue: VecDeque<Packet>,
    /// PAT 是否已解析
    pat_parsed: bool,
    /// PMT 是否已解析
    pmt_parsed: bool,
    /// 下一个 TS 包在文件中的偏移
    ts_offset: u64,
    /// 打开时最多预读的 TS 包数
    probe_packets: usize,
    /// 文件末尾的残留 PES 是否已刷新
    eof_flushed: bool,
}

impl TsDemuxer {
    /// 创建解封装器
    pub fn new() -> Self {
        Self {
            streams: Vec::new(),
            pmt_pid: 0,
            pid_to_stream: HashMap::new(),
            pes_buffers: HashMap::new(),
            packet_queue: VecDeque::new(),
            pat_parsed: false,
            pmt_parsed: false,
            ts_offset: 0,
            probe_packets: DEFAULT_PROBE_PACKETS,
            eof_flushed: false,
        }
    }

    /// 创建 MPEG-TS 解封装器实例 (工厂函数)
    pub fn create() -> ByteSegResult<Box<dyn Demuxer>> {
        Ok(Box::new(Self::new()))
    }

    /// 读取一个 188 字节的 TS 包, 返回包内容和包起始偏移
    ///
    /// 读取失败时不消耗任何字节, 可以原样重试.
    /// 同步字节不匹配时重新同步到下一个有效包, 并返回 `InvalidData`.
    fn read_ts_packet(&mut self, io: &mut IoContext) -> ByteSegResult<([u8; TS_PACKET_SIZE], u64)> {
        let start = self.ts_offset;
        let mut pkt = [0u8; TS_PACKET_SIZE];
        io.read_exact(&mut pkt)?;
        self.ts_offset += TS_PACKET_SIZE as u64;

        if pkt[0] != TS_SYNC_BYTE {
            warn!("TS: 偏移 {start} 处同步字节不匹配, 重新同步");
            if io.is_seekable() {
                io.seek(std::io::SeekFrom::Start(start + 1))?;
                if let Err(e) = self.sync_to_packet(io) {
                    // 搜索中途失败时从当前位置继续
                    self.ts_offset = io.position()?;
                    return Err(e);
                }
            }
            return Err(ByteSegError::InvalidData(format!(
                "TS: 偏移 {start} 处同步字节不匹配"
            )));
        }
        Ok((pkt, start))
    }

    /// 同步到下一个有效的 TS 包
    ///
    /// 要求找到的同步字节之后 188 字节处仍是同步字节.
    fn sync_to_packet(&mut self, io: &mut IoContext) -> ByteSegResult<()> {
        for _ in 0..MAX_SYNC_SEARCH {
            let b = io.read_u8()?;
            if b == TS_SYNC_BYTE {
                let pos = io.position()?;
                let mut check = [0u8; TS_PACKET_SIZE];
                if io.read_exact(&mut check).is_ok() && check[TS_PACKET_SIZE - 1] == TS_SYNC_BYTE
                {
                    // 找到有效同步, 跳回 sync byte 处
                    io.seek(std::io::SeekFrom::Start(pos - 1))?;
                    self.ts_offset = pos - 1;
                    return Ok(());
                }
                // 没验证通过, 回到当前位置继续搜索
                io.seek(std::io::SeekFrom::Start(pos))?;
            }
        }
        Err(ByteSegError::InvalidData("TS: 找不到同步字节".into()))
    }

    /// 解析 TS 包头 (4 字节)
    fn parse_ts_header(pkt: &[u8; TS_PACKET_SIZE]) -> (u16, bool, u8) {
        let pid = (u16::from(pkt[1] & 0x1F) << 8) | u16::from(pkt[2]);
        let pusi = (pkt[1] & 0x40) != 0; // Payload Unit Start Indicator
        let afc = (pkt[3] >> 4) & 0x03; // Adaptation Field Control
        (pid, pusi, afc)
    }

    /// 获取 payload 的偏移, 以及 adaptation field 中的 random_access_indicator
    fn payload_offset(pkt: &[u8; TS_PACKET_SIZE], afc: u8) -> (usize, bool) {
        let mut offset = 4;
        let mut has_random_access = false;

        if afc == 2 || afc == 3 {
            let af_len = pkt[offset] as usize;
            if af_len > 0 {
                has_random_access = (pkt[offset + 1] & 0x40) != 0;
            }
            offset += 1 + af_len;
        }

        // afc==1 或 afc==3 表示有 payload
        if (afc == 1 || afc == 3) && offset < TS_PACKET_SIZE {
            (offset, has_random_access)
        } else {
            (TS_PACKET_SIZE, has_random_access)
        }
    }

    /// 解析 PAT (Program Association Table)
    fn parse_pat(&mut self, payload: &[u8]) {
        if self.pat_parsed || payload.len() < 12 {
            return;
        }
        let section_length = (u16::from(payload[1] & 0x0F) << 8 | u16::from(payload[2])) as usize;

        // 跳过 transport_stream_id(2) + version/flags(1) + section_number(1) + last_section(1)
        let entries_start = 8;
        let entries_end = (3 + section_length).min(payload.len()).saturating_sub(4); // 减去 CRC
        if entries_end <= entries_start {
            return;
        }

        // 每个条目 4 字节: program_number(2) + PID(2)
        for chunk in payload[entries_start..entries_end].chunks_exact(4) {
            let program_number = u16::from(chunk[0]) << 8 | u16::from(chunk[1]);
            let pid = (u16::from(chunk[2] & 0x1F) << 8) | u16::from(chunk[3]);

            if program_number != 0 {
                // 只取第一个节目
                self.pmt_pid = pid;
                self.pat_parsed = true;
                debug!("TS PAT: program={program_number} PMT_PID={pid:#06X}");
                break;
            }
        }
    }

    /// 解析 PMT (Program Map Table)
    ///
    /// 未知 stream_type 也会建流 (媒体类型为数据), 由调用方决定是否丢弃.
    fn parse_pmt(&mut self, payload: &[u8]) {
        if self.pmt_parsed || payload.len() < 16 || payload[0] != 0x02 {
            return;
        }
        let section_length = (u16::from(payload[1] & 0x0F) << 8 | u16::from(payload[2])) as usize;
        let prog_info_len = (u16::from(payload[10] & 0x0F) << 8 | u16::from(payload[11])) as usize;

        let mut pos = 12 + prog_info_len;
        let section_end = (3 + section_length).min(payload.len()).saturating_sub(4); // 减去 CRC

        while pos + 5 <= section_end {
            let stream_type = payload[pos];
            let es_pid = (u16::from(payload[pos + 1] & 0x1F) << 8) | u16::from(payload[pos + 2]);
            let es_info_len =
                (u16::from(payload[pos + 3] & 0x0F) << 8 | u16::from(payload[pos + 4])) as usize;
            pos += 5 + es_info_len;

            if self.pid_to_stream.contains_key(&es_pid) {
                continue;
            }

            let codec_id = stream_type_to_codec(stream_type);
            let stream_index = self.streams.len();
            debug!(
                "TS PMT: stream_type=0x{stream_type:02X} PID={es_pid:#06X} codec={codec_id} -> 流 #{stream_index}"
            );

            self.streams.push(Stream {
                index: stream_index,
                media_type: codec_id.media_type(),
                codec_id,
                id: u32::from(es_pid),
                stream_type,
                discard: Discard::None,
            });
            self.pid_to_stream.insert(es_pid, stream_index);
            self.pes_buffers
                .insert(es_pid, PesBuffer::new(stream_index));
        }

        self.pmt_parsed = true;
    }

    /// 流是否需要输出数据包
    fn is_pid_active(&self, pid: u16) -> bool {
        self.pid_to_stream
            .get(&pid)
            .is_some_and(|&idx| self.streams[idx].is_active())
    }

    /// 处理 PES 数据
    fn handle_pes_data(
        &mut self,
        pid: u16,
        payload: &[u8],
        pusi: bool,
        random_access: bool,
        ts_start: u64,
    ) {
        if !self.is_pid_active(pid) {
            return;
        }

        if pusi {
            // Payload Unit Start: 先 flush 旧数据, 再开始新 PES
            self.flush_pes(pid);

            if let Some(buf) = self.pes_buffers.get_mut(&pid) {
                buf.random_access = random_access;
                buf.start_pos = Some(ts_start);
                let header_len = pes_header_len(payload).unwrap_or(0);
                buf.data.extend_from_slice(&payload[header_len.min(payload.len())..]);
            }
        } else if let Some(buf) = self.pes_buffers.get_mut(&pid) {
            // 没有见到起始包的续包没有意义
            if buf.start_pos.is_none() {
                return;
            }
            buf.data.extend_from_slice(payload);
            if random_access {
                buf.random_access = true;
            }
        }
    }

    /// 将 PES 缓冲区刷新为数据包
    fn flush_pes(&mut self, pid: u16) {
        let Some(buf) = self.pes_buffers.get_mut(&pid) else {
            return;
        };
        let Some(start_pos) = buf.start_pos else {
            return;
        };

        let codec_id = self.streams[buf.stream_index].codec_id;
        let data = std::mem::take(&mut buf.data);
        let is_keyframe = buf.random_access || contains_keyframe_nal(codec_id, &data);

        let mut pkt = Packet::from_data(Bytes::from(data));
        pkt.stream_index = buf.stream_index;
        pkt.is_keyframe = is_keyframe;
        pkt.pos = start_pos;

        self.packet_queue.push_back(pkt);
        buf.clear();
    }

    /// 文件结束时按流顺序刷新所有残留的 PES
    fn flush_all(&mut self) {
        let mut pids: Vec<(usize, u16)> = self
            .pes_buffers
            .iter()
            .map(|(&pid, buf)| (buf.stream_index, pid))
            .collect();
        pids.sort_unstable();
        for (_, pid) in pids {
            if self.is_pid_active(pid) {
                self.flush_pes(pid);
            }
        }
    }

    /// 处理一个 TS 包
    fn process_packet(&mut self, pkt: &[u8; TS_PACKET_SIZE], ts_start: u64) {
        let (pid, pusi, afc) = Self::parse_ts_header(pkt);

        if pid == PID_NULL {
            return;
        }

        let (payload_off, random_access) = Self::payload_offset(pkt, afc);
        if payload_off >= TS_PACKET_SIZE {
            return;
        }

        let payload = &pkt[payload_off..];

        // PSI 表处理
        if pid == PID_PAT || (self.pat_parsed && pid == self.pmt_pid) {
            if pusi && !payload.is_empty() {
                // pointer_field
                let section_start = 1 + payload[0] as usize;
                if section_start < payload.len() {
                    if pid == PID_PAT {
                        self.parse_pat(&payload[section_start..]);
                    } else {
                        self.parse_pmt(&payload[section_start..]);
                    }
                }
            }
            return;
        }

        // ES 数据
        if self.pmt_parsed {
            self.handle_pes_data(pid, payload, pusi, random_access, ts_start);
        }
    }

    /// 给队首的包盖上读取游标并取出
    fn pop_stamped(&mut self, io: &mut IoContext) -> ByteSegResult<Option<Packet>> {
        match self.packet_queue.pop_front() {
            Some(mut pkt) => {
                pkt.read_pos = io.position()?;
                Ok(Some(pkt))
            }
            None => Ok(None),
        }
    }
}

impl Default for TsDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

/// 在 H.264/H.265 的 Annex B 码流中查找 IDR/IRAP NAL
///
/// 用于复用器没有设置 random_access_indicator 的情况.
fn contains_keyframe_nal(codec_id: CodecId, data: &[u8]) -> bool {
    if !matches!(codec_id, CodecId::H264 | CodecId::H265) {
        return false;
    }
    let mut i = 0;
    while i + 3 < data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            let header = data[i + 3];
            let is_key = match codec_id {
                CodecId::H264 => header & 0x1F == 5,
                _ => (16..=21).contains(&((header >> 1) & 0x3F)),
            };
            if is_key {
                return true;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    false
}

/// PES 包头长度
///
/// 不是 PES 起始码时返回 None, 整段当作负载.
fn pes_header_len(data: &[u8]) -> Option<usize> {
    // PES start code: 00 00 01 + stream_id
    if data.len() < 9 || data[0] != 0x00 || data[1] != 0x00 || data[2] != 0x01 {
        return None;
    }
    // data[6]: 10xxxxxx, 否则没有可选头 (padding stream 等)
    if (data[6] & 0xC0) != 0x80 {
        return Some(6);
    }
    Some((9 + data[8] as usize).min(data.len()))
}

impl Demuxer for TsDemuxer {
    fn name(&self) -> &str {
        "mpegts"
    }

    fn set_probe_packets(&mut self, packets: usize) {
        self.probe_packets = packets.max(1);
    }

    fn open(&mut self, io: &mut IoContext) -> ByteSegResult<()> {
        self.sync_to_packet(io)?;

        // 预读 TS 包直到解析出 PAT + PMT
        for _ in 0..self.probe_packets {
            let (pkt, start) = match self.read_ts_packet(io) {
                Ok(p) => p,
                Err(ByteSegError::Eof) => break,
                Err(ByteSegError::InvalidData(_)) => continue,
                Err(e) => return Err(e),
            };

            self.process_packet(&pkt, start);

            if self.pat_parsed && self.pmt_parsed {
                break;
            }
        }

        if !self.pat_parsed || !self.pmt_parsed {
            return Err(ByteSegError::InvalidData(
                "TS: 预读范围内未找到 PAT/PMT".into(),
            ));
        }

        // 回到文件开头重新读取
        io.seek(std::io::SeekFrom::Start(0))?;
        self.sync_to_packet(io)?;
        self.packet_queue.clear();
        for buf in self.pes_buffers.values_mut() {
            buf.clear();
        }
        self.eof_flushed = false;

        debug!("TS: 打开完成, {} 个流", self.streams.len());
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn set_discard(&mut self, stream_index: usize, discard: Discard) -> ByteSegResult<()> {
        let stream = self
            .streams
            .get_mut(stream_index)
            .ok_or(ByteSegError::StreamNotFound(stream_index))?;
        stream.discard = discard;
        if discard == Discard::All {
            let pid = stream.id as u16;
            if let Some(buf) = self.pes_buffers.get_mut(&pid) {
                buf.clear();
            }
            self.packet_queue.retain(|p| p.stream_index != stream_index);
        }
        Ok(())
    }

    fn read_packet(&mut self, io: &mut IoContext) -> ByteSegResult<Packet> {
        loop {
            if let Some(pkt) = self.pop_stamped(io)? {
                return Ok(pkt);
            }
            if self.eof_flushed {
                return Err(ByteSegError::Eof);
            }

            match self.read_ts_packet(io) {
                Ok((pkt, start)) => self.process_packet(&pkt, start),
                Err(ByteSegError::Eof) => {
                    self.flush_all();
                    self.eof_flushed = true;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// MPEG-TS 格式探测器
pub struct TsProbe;

impl FormatProbe for TsProbe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        // 检查连续的 TS 同步字节
        if data.len() >= TS_PACKET_SIZE * 2 {
            for start in 0..data.len().min(TS_PACKET_SIZE) {
                let sync_count = data[start..]
                    .iter()
                    .step_by(TS_PACKET_SIZE)
                    .take_while(|&&b| b == TS_SYNC_BYTE)
                    .count();
                if sync_count >= 3 {
                    return Some(probe::SCORE_MAX);
                }
                if sync_count >= 2 {
                    return Some(probe::SCORE_MAX - 10);
                }
            }
        }

        if probe::extension_matches(filename, FormatId::MpegTs) {
            return Some(probe::SCORE_EXTENSION);
        }

        None
    }
}
