//! 集成测试共用的 TS 码流构造工具
//!
//! 每个帧占一个带 adaptation field 的 TS 包, 关键帧置 random_access_indicator,
//! 因此文件中的字节偏移可以直接按包序号计算.

#![allow(dead_code)]

pub const TS_PACKET_SIZE: usize = 188;
const TS_SYNC_BYTE: u8 = 0x47;

pub const PMT_PID: u16 = 0x100;
pub const STREAM_TYPE_H264: u8 = 0x1B;
pub const STREAM_TYPE_AAC: u8 = 0x0F;

/// 打开测试日志 (只初始化一次)
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ts_packet(pid: u16, pusi: bool, af: Option<bool>, payload: &[u8]) -> [u8; TS_PACKET_SIZE] {
    let mut pkt = [0xFFu8; TS_PACKET_SIZE];
    pkt[0] = TS_SYNC_BYTE;
    pkt[1] = (if pusi { 0x40 } else { 0x00 }) | ((pid >> 8) as u8 & 0x1F);
    pkt[2] = pid as u8;
    match af {
        None => {
            pkt[3] = 0x10; // AFC=01
            let n = payload.len().min(TS_PACKET_SIZE - 4);
            pkt[4..4 + n].copy_from_slice(&payload[..n]);
        }
        Some(random_access) => {
            pkt[3] = 0x30; // AFC=11
            let space = TS_PACKET_SIZE - 6;
            let n = payload.len().min(space);
            let stuffing = space - n;
            pkt[4] = (1 + stuffing) as u8;
            pkt[5] = if random_access { 0x40 } else { 0x00 };
            let start = 6 + stuffing;
            pkt[start..start + n].copy_from_slice(&payload[..n]);
        }
    }
    pkt
}

fn pat(pmt_pid: u16) -> [u8; TS_PACKET_SIZE] {
    let mut section = vec![0x00, 0x00, 0xB0, 13, 0x00, 0x01, 0xC1, 0x00, 0x00];
    section.extend_from_slice(&[0x00, 0x01]);
    section.push(0xE0 | ((pmt_pid >> 8) as u8 & 0x1F));
    section.push(pmt_pid as u8);
    section.extend_from_slice(&[0x00; 4]);
    ts_packet(0x0000, true, None, &section)
}

fn pmt(pmt_pid: u16, entries: &[(u8, u16)]) -> [u8; TS_PACKET_SIZE] {
    let section_length = 9 + entries.len() * 5 + 4;
    let mut section = vec![0x00, 0x02, 0xB0 | ((section_length >> 8) as u8 & 0x0F)];
    section.push(section_length as u8);
    section.extend_from_slice(&[0x00, 0x01, 0xC1, 0x00, 0x00]);
    let pcr_pid = entries.first().map_or(0x1FFF, |e| e.1);
    section.push(0xE0 | ((pcr_pid >> 8) as u8 & 0x1F));
    section.push(pcr_pid as u8);
    section.extend_from_slice(&[0xF0, 0x00]);
    for &(stream_type, pid) in entries {
        section.push(stream_type);
        section.push(0xE0 | ((pid >> 8) as u8 & 0x1F));
        section.push(pid as u8);
        section.extend_from_slice(&[0xF0, 0x00]);
    }
    section.extend_from_slice(&[0x00; 4]);
    ts_packet(pmt_pid, true, None, &section)
}

fn pes(stream_id: u8, pts: u64, data: &[u8]) -> Vec<u8> {
    let len = 3 + 5 + data.len();
    let mut pes = vec![0x00, 0x00, 0x01, stream_id, (len >> 8) as u8, len as u8];
    pes.extend_from_slice(&[0x80, 0x80, 5]);
    pes.extend_from_slice(&[
        0x21 | ((((pts >> 30) as u8) & 0x07) << 1),
        (pts >> 22) as u8,
        0x01 | ((((pts >> 15) as u8) & 0x7F) << 1),
        (pts >> 7) as u8,
        0x01 | (((pts as u8) & 0x7F) << 1),
    ]);
    pes.extend_from_slice(data);
    pes
}

/// 合成 TS 码流
pub struct TsBuilder {
    data: Vec<u8>,
    pts: u64,
}

impl TsBuilder {
    /// 写入 PAT 和 PMT, `entries` 为 (stream_type, pid)
    pub fn new(entries: &[(u8, u16)]) -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(&pat(PMT_PID));
        data.extend_from_slice(&pmt(PMT_PID, entries));
        Self { data, pts: 0 }
    }

    /// 追加一个视频帧 (单个 TS 包)
    pub fn video(&mut self, pid: u16, keyframe: bool) -> &mut Self {
        let pes = pes(0xE0, self.pts, &[0x42; 16]);
        self.pts += 3600;
        self.data
            .extend_from_slice(&ts_packet(pid, true, Some(keyframe), &pes));
        self
    }

    /// 追加一个音频帧 (单个 TS 包)
    pub fn audio(&mut self, pid: u16) -> &mut Self {
        let pes = pes(0xC0, self.pts, &[0x24; 16]);
        self.data.extend_from_slice(&ts_packet(pid, true, Some(false), &pes));
        self
    }

    /// 追加一段垃圾数据
    pub fn garbage(&mut self, len: usize) -> &mut Self {
        self.data.extend(std::iter::repeat_n(0x00, len));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.data.clone()
    }
}

/// 写入临时 .ts 文件
pub fn write_temp_ts(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::Builder::new()
        .suffix(".ts")
        .tempfile()
        .expect("创建临时文件失败");
    file.write_all(data).expect("写入临时文件失败");
    file.flush().expect("刷新临时文件失败");
    file
}
