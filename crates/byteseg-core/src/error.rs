//! 统一错误类型定义.
//!
//! 所有 byteseg crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// byteseg 统一错误类型
#[derive(Debug, Error)]
pub enum ByteSegError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 容器格式错误
    #[error("格式错误: {0}")]
    Format(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 未找到指定的容器格式
    #[error("未找到容器格式: {0}")]
    FormatNotFound(String),

    /// 未找到指定的流
    #[error("未找到流: 索引 {0}")]
    StreamNotFound(usize),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),
}

/// byteseg 统一 Result 类型
pub type ByteSegResult<T> = Result<T, ByteSegError>;

impl ByteSegError {
    /// 是否为 I/O 层面的错误 (底层读写失败)
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
