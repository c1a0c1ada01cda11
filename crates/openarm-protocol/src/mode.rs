//! 电机控制模式编码
//!
//! 控制模式寄存器（RID `CTRL_MODE`）的取值是一个带保留端点的
//! 整数编码枚举：`CONTROL_MODE_MIN` 和 `CONTROL_MODE_MAX` 是范围
//! 标记，不是可设置的模式；合法的操作员输入满足
//! `CONTROL_MODE_MIN < code < CONTROL_MODE_MAX`（两端严格排除）。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 控制模式编码下界（保留值，不可设置）
pub const CONTROL_MODE_MIN: u8 = 0;

/// 控制模式编码上界（保留值，不可设置）
pub const CONTROL_MODE_MAX: u8 = 5;

/// 电机控制模式
///
/// 电机可能上报会话预期之外的编码，因此解码必须是全函数：
/// 编码转名称用 [`ControlMode::label`]，越界编码得到 `"unknown"`
/// 而不是解析失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ControlMode {
    /// MIT 力位混合模式
    Mit = 1,
    /// 位置速度模式
    PosVel = 2,
    /// 速度模式
    Vel = 3,
    /// 力位模式
    ForcePos = 4,
}

impl ControlMode {
    /// 编码转人类可读名称（全函数）
    pub fn label(code: u8) -> &'static str {
        match ControlMode::try_from(code) {
            Ok(ControlMode::Mit) => "MIT",
            Ok(ControlMode::PosVel) => "position/velocity",
            Ok(ControlMode::Vel) => "velocity",
            Ok(ControlMode::ForcePos) => "force/position",
            Err(_) => "unknown",
        }
    }

    /// 操作员输入是否为可设置的模式编码
    ///
    /// 两端严格排除：`CONTROL_MODE_MIN` 和 `CONTROL_MODE_MAX`
    /// 本身都是保留值。
    pub fn is_settable(code: i64) -> bool {
        (CONTROL_MODE_MIN as i64) < code && code < (CONTROL_MODE_MAX as i64)
    }

    /// 列出全部可设置的模式编码（升序）
    pub fn settable_codes() -> impl Iterator<Item = u8> {
        (CONTROL_MODE_MIN + 1)..CONTROL_MODE_MAX
    }
}
