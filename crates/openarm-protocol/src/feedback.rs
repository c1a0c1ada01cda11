//! 反馈帧解析
//!
//! 电机的参数回复和状态遥测复用同一种 8 字节帧外形，
//! 帧本身不携带类别标记——由上层根据该电机当前的回调模式
//! 选择用 [`ParamReply`] 还是 [`StateReply`] 解码。

use crate::constants::*;
use crate::{ArmFrame, ProtocolError};

/// 参数回复帧
///
/// 电机对参数读取/写入指令的回报，格式与指令一致：
/// `[id_l, id_h, cmd, rid, v0, v1, v2, v3]`。
/// 写入指令的回显（cmd = 0x55）与读取回复（cmd = 0x33）
/// 携带同样的寄存器值，统一解析。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamReply {
    /// 回显的电机发送 CAN ID
    pub motor_id: u16,
    /// 指令字节（0x33 读 / 0x55 写回显）
    pub command: u8,
    /// 寄存器编号
    pub rid: u8,
    /// 解码后的寄存器值（按寄存器类别解码）
    pub value: f64,
}

impl TryFrom<&ArmFrame> for ParamReply {
    type Error = ProtocolError;

    fn try_from(frame: &ArmFrame) -> Result<Self, Self::Error> {
        if frame.len as usize != 8 {
            return Err(ProtocolError::InvalidLength {
                expected: 8,
                actual: frame.len as usize,
            });
        }

        let command = frame.data[2];
        if command != CMD_PARAM_READ && command != CMD_PARAM_WRITE {
            return Err(ProtocolError::InvalidCommand { command });
        }

        let motor_id = u16::from_le_bytes([frame.data[0], frame.data[1]]);
        let rid = frame.data[3];

        let raw = [frame.data[4], frame.data[5], frame.data[6], frame.data[7]];
        let value = if rid_is_float(rid) {
            f32::from_le_bytes(raw) as f64
        } else {
            u32::from_le_bytes(raw) as f64
        };

        Ok(Self {
            motor_id,
            command,
            rid,
            value,
        })
    }
}

/// 状态遥测帧（原始计数）
///
/// 位置/速度/扭矩保持协议原始计数，不做单位换算——
/// 换算依赖电机型号的量程表，由电机模型层负责。
///
/// 帧布局：
/// `D0[3:0]` 电机 ID 低 4 位，`D0[7:4]` 错误码，
/// `D1..D2` 位置（16 bit），`D3..D4[7:4]` 速度（12 bit），
/// `D4[3:0]..D5` 扭矩（12 bit），`D6` MCU 温度，`D7` 转子温度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateReply {
    /// 电机 ID 低 4 位
    pub motor_id_nibble: u8,
    /// 错误码（0 表示正常）
    pub error_code: u8,
    /// 位置原始计数（16 bit）
    pub position_raw: u16,
    /// 速度原始计数（12 bit）
    pub velocity_raw: u16,
    /// 扭矩原始计数（12 bit）
    pub torque_raw: u16,
    /// MCU 温度（℃）
    pub temp_mcu: u8,
    /// 转子温度（℃）
    pub temp_rotor: u8,
}

impl TryFrom<&ArmFrame> for StateReply {
    type Error = ProtocolError;

    fn try_from(frame: &ArmFrame) -> Result<Self, Self::Error> {
        if frame.len as usize != 8 {
            return Err(ProtocolError::InvalidLength {
                expected: 8,
                actual: frame.len as usize,
            });
        }

        let d = &frame.data;
        Ok(Self {
            motor_id_nibble: d[0] & 0x0F,
            error_code: d[0] >> 4,
            position_raw: u16::from_be_bytes([d[1], d[2]]),
            velocity_raw: ((d[3] as u16) << 4) | ((d[4] as u16) >> 4),
            torque_raw: (((d[4] & 0x0F) as u16) << 8) | d[5] as u16,
            temp_mcu: d[6],
            temp_rotor: d[7],
        })
    }
}
