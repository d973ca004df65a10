//! 内置解封装器.

pub mod mpegts;

use crate::format_id::FormatId;
use crate::registry::FormatRegistry;

/// 注册所有内置解封装器和探测器
pub fn register_all_demuxers(registry: &mut FormatRegistry) {
    registry.register(
        FormatId::MpegTs,
        mpegts::TsDemuxer::create,
        Box::new(mpegts::TsProbe),
    );
}
