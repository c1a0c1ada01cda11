//! 控制帧构建
//!
//! 包含参数读写指令和电机使能/失能指令的结构体。
//! 所有指令都发送到目标电机的发送 CAN ID。

use crate::constants::*;
use crate::ArmFrame;

/// 参数读取指令
///
/// 请求电机回报指定寄存器的当前值。
/// 帧格式：`[id_l, id_h, 0x33, rid, 0, 0, 0, 0]`。
#[derive(Debug, Clone, Copy)]
pub struct ParamReadCommand {
    /// 目标电机发送 CAN ID
    pub motor_id: u16,
    /// 寄存器编号
    pub rid: u8,
}

impl ParamReadCommand {
    pub fn new(motor_id: u16, rid: u8) -> Self {
        Self { motor_id, rid }
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self) -> ArmFrame {
        let mut data = [0u8; 8];
        data[0] = (self.motor_id & 0xFF) as u8;
        data[1] = (self.motor_id >> 8) as u8;
        data[2] = CMD_PARAM_READ;
        data[3] = self.rid;
        // Byte 4-7: 保留，已初始化为 0

        ArmFrame::new_standard(self.motor_id, &data)
    }
}

/// 参数写入指令
///
/// 将数值写入指定寄存器。数值按寄存器类别编码：
/// 浮点寄存器按 `f32` 小端，整数寄存器按 `u32` 小端。
/// 帧格式：`[id_l, id_h, 0x55, rid, v0, v1, v2, v3]`。
///
/// 本指令不校验数值范围，范围校验是上层会话的职责。
#[derive(Debug, Clone, Copy)]
pub struct ParamWriteCommand {
    /// 目标电机发送 CAN ID
    pub motor_id: u16,
    /// 寄存器编号
    pub rid: u8,
    /// 待写入的数值
    pub value: f64,
}

impl ParamWriteCommand {
    pub fn new(motor_id: u16, rid: u8, value: f64) -> Self {
        Self {
            motor_id,
            rid,
            value,
        }
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self) -> ArmFrame {
        let encoded: [u8; 4] = if rid_is_float(self.rid) {
            (self.value as f32).to_le_bytes()
        } else {
            (self.value as u32).to_le_bytes()
        };

        let mut data = [0u8; 8];
        data[0] = (self.motor_id & 0xFF) as u8;
        data[1] = (self.motor_id >> 8) as u8;
        data[2] = CMD_PARAM_WRITE;
        data[3] = self.rid;
        data[4..8].copy_from_slice(&encoded);

        ArmFrame::new_standard(self.motor_id, &data)
    }
}

/// 电机使能指令
///
/// 帧格式：`[0xFF × 7, 0xFC]`。
#[derive(Debug, Clone, Copy)]
pub struct MotorOnCommand {
    pub motor_id: u16,
}

impl MotorOnCommand {
    pub fn new(motor_id: u16) -> Self {
        Self { motor_id }
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self) -> ArmFrame {
        let mut data = [0xFFu8; 8];
        data[7] = CMD_MOTOR_ON;
        ArmFrame::new_standard(self.motor_id, &data)
    }
}

/// 电机失能指令
///
/// 帧格式：`[0xFF × 7, 0xFD]`。失能后电机仍会回报一帧状态遥测。
#[derive(Debug, Clone, Copy)]
pub struct MotorOffCommand {
    pub motor_id: u16,
}

impl MotorOffCommand {
    pub fn new(motor_id: u16) -> Self {
        Self { motor_id }
    }

    /// 转换为 CAN 帧
    pub fn to_frame(self) -> ArmFrame {
        let mut data = [0xFFu8; 8];
        data[7] = CMD_MOTOR_OFF;
        ArmFrame::new_standard(self.motor_id, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::rid;

    #[test]
    fn test_param_read_command_to_frame() {
        let frame = ParamReadCommand::new(0x03, rid::CTRL_MODE).to_frame();
        assert_eq!(frame.id(), 0x03);
        assert_eq!(frame.len, 8);
        assert_eq!(
            frame.data,
            [0x03, 0x00, CMD_PARAM_READ, rid::CTRL_MODE, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_param_write_command_uint_register() {
        let frame = ParamWriteCommand::new(0x08, rid::CTRL_MODE, 2.0).to_frame();
        assert_eq!(frame.id(), 0x08);
        assert_eq!(frame.data[2], CMD_PARAM_WRITE);
        assert_eq!(frame.data[3], rid::CTRL_MODE);
        // u32 小端编码
        assert_eq!(&frame.data[4..8], &2u32.to_le_bytes());
    }

    #[test]
    fn test_param_write_command_float_register() {
        let frame = ParamWriteCommand::new(0x01, rid::KT_VALUE, 1.5).to_frame();
        assert_eq!(&frame.data[4..8], &1.5f32.to_le_bytes());
    }

    #[test]
    fn test_motor_on_off_commands() {
        let on = MotorOnCommand::new(0x05).to_frame();
        assert_eq!(on.data, [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC]);
        assert_eq!(on.id(), 0x05);

        let off = MotorOffCommand::new(0x05).to_frame();
        assert_eq!(off.data, [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFD]);
    }
}
