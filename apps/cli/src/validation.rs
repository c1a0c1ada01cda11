//! 输入验证模块
//!
//! 操作员可见值的范围校验放在会话层，驱动引擎不做校验。

use anyhow::{bail, Result};
use openarm_protocol::{ControlMode, CONTROL_MODE_MAX, CONTROL_MODE_MIN};

/// 控制模式编码验证器
///
/// 合法编码满足 `min < code < max`，两端是保留的范围标记，
/// 严格排除。
pub struct ModeValidator {
    min: i64,
    max: i64,
}

impl ModeValidator {
    pub fn new() -> Self {
        Self {
            min: CONTROL_MODE_MIN as i64,
            max: CONTROL_MODE_MAX as i64,
        }
    }

    /// 校验操作员输入的目标模式编码
    ///
    /// # 错误
    /// 编码落在开区间之外时返回错误，错误信息包含被拒绝的值。
    pub fn validate(&self, code: i64) -> Result<u8> {
        if !ControlMode::is_settable(code) {
            bail!(
                "Invalid control mode value received: {} (valid range: {} < value < {})",
                code,
                self.min,
                self.max
            );
        }
        Ok(code as u8)
    }
}

impl Default for ModeValidator {
    fn default() -> Self {
        Self::new()
    }
}
