//! # byteseg-core
//!
//! byteseg 的核心库, 提供各 crate 共用的基础类型和错误定义.

pub mod error;
pub mod media_type;
pub mod rational;

// 重导出常用类型
pub use error::{ByteSegError, ByteSegResult};
pub use media_type::MediaType;
pub use rational::Rational;
