//! 格式探测.
//!
//! 通过分析文件头部数据和文件扩展名, 判断输入是否为某种容器格式.

use crate::format_id::FormatId;

/// 探测置信度
///
/// 数值越高, 表示对格式判断越有信心.
pub type ProbeScore = u32;

/// 最低探测分数 (仅根据扩展名)
pub const SCORE_EXTENSION: ProbeScore = 50;

/// 最高探测分数 (魔数完全匹配)
pub const SCORE_MAX: ProbeScore = 100;

/// 格式探测器 trait
pub trait FormatProbe {
    /// 根据文件头部数据探测格式
    ///
    /// # 参数
    /// - `data`: 文件开头的若干字节
    /// - `filename`: 文件名 (可选, 用于扩展名匹配)
    ///
    /// # 返回
    /// - `Some(score)`: 探测成功, 返回置信度
    /// - `None`: 不是此格式
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore>;
}

/// 按扩展名匹配格式
pub(crate) fn extension_matches(filename: Option<&str>, format_id: FormatId) -> bool {
    let Some(name) = filename else {
        return false;
    };
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    format_id.extensions().contains(&ext.as_str())
}
