//! 容器格式标识符.

use std::fmt;

/// 容器格式标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FormatId {
    /// MPEG Transport Stream (TS)
    MpegTs,
}

impl FormatId {
    /// 获取格式的短名称 (与 FFmpeg `-f` 参数一致)
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MpegTs => "mpegts",
        }
    }

    /// 根据短名称查找格式
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mpegts" | "ts" => Some(Self::MpegTs),
            _ => None,
        }
    }

    /// 该格式常见的文件扩展名
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::MpegTs => &["ts", "m2ts", "mts"],
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
