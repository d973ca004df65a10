//! 有理数类型, 用于帧率.
//!
//! 对标 FFmpeg 的 `AVRational`.

use std::fmt;
use std::str::FromStr;

use crate::error::ByteSegError;

/// 有理数, 由分子和分母组成
///
/// 例如: 帧率 30000/1001 表示 29.97fps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// 分子
    pub num: i32,
    /// 分母
    pub den: i32,
}

impl Rational {
    /// 创建新的有理数
    ///
    /// # 参数
    /// - `num`: 分子
    /// - `den`: 分母 (不应为 0)
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 是否为严格正数
    pub const fn is_positive(&self) -> bool {
        self.den != 0 && (self.num > 0) == (self.den > 0) && self.num != 0
    }

    /// 转换为 f64 浮点数
    ///
    /// 如果分母为 0, 返回 `f64::NAN`.
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return f64::NAN;
        }
        f64::from(self.num) / f64::from(self.den)
    }

    /// 以本值为速率 (每秒 num/den 个单位), 计算 `count` 个单位的整数秒数
    ///
    /// 截断取整: 29 帧 @ 10fps 得 2, 不是 3. 速率非正时返回 0.
    /// 分子分母取绝对值后直接在 u128 中计算, 任何 i32 取值都不会溢出.
    pub fn whole_seconds(self, count: u64) -> u64 {
        if !self.is_positive() {
            return 0;
        }
        let num = u128::from(self.num.unsigned_abs());
        let den = u128::from(self.den.unsigned_abs());
        u64::try_from(u128::from(count) * den / num).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Self { num, den: 1 }
    }
}

/// 解析 "25" 或 "30000/1001" 形式的字符串
impl FromStr for Rational {
    type Err = ByteSegError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ByteSegError::InvalidArgument(format!("无法解析有理数: '{s}'"));
        if let Some((num, den)) = s.split_once('/') {
            let num: i32 = num.trim().parse().map_err(|_| invalid())?;
            let den: i32 = den.trim().parse().map_err(|_| invalid())?;
            Ok(Self::new(num, den))
        } else {
            let num: i32 = s.parse().map_err(|_| invalid())?;
            Ok(Self::new(num, 1))
        }
    }
}
