//! 电机注册表
//!
//! 持有机械臂（arm）和夹爪（gripper）两个有序电机组。
//! 顺序即配置顺序，影响显示和请求发出顺序，不影响语义。
//!
//! 注册表是全局可变状态（每电机参数表 + 回调模式标志）的唯一
//! 持有者，所有变更通过注册表方法进行。

use crate::error::DriverError;
use crate::motor::{CallbackMode, Motor, MotorType};
use std::collections::HashSet;

/// 电机注册表
#[derive(Debug, Default)]
pub struct MotorRegistry {
    arm: Vec<Motor>,
    gripper: Vec<Motor>,
}

impl MotorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 批量注册机械臂电机
    ///
    /// 三个切片按位置一一对应。任何发送/接收 CAN ID 与已注册
    /// 电机（跨组）或本批次内部冲突都会失败，注册表保持不变。
    ///
    /// # 错误
    /// - `DriverError::Config`: 切片长度不一致或地址冲突
    pub fn add_arm_motors(
        &mut self,
        motor_types: &[MotorType],
        send_can_ids: &[u16],
        recv_can_ids: &[u16],
    ) -> Result<(), DriverError> {
        if motor_types.len() != send_can_ids.len() || send_can_ids.len() != recv_can_ids.len() {
            return Err(DriverError::Config(format!(
                "Mismatched arm motor config lengths: {} types, {} send IDs, {} recv IDs",
                motor_types.len(),
                send_can_ids.len(),
                recv_can_ids.len()
            )));
        }

        let motors: Vec<Motor> = motor_types
            .iter()
            .zip(send_can_ids)
            .zip(recv_can_ids)
            .map(|((&motor_type, &send), &recv)| Motor::new(motor_type, send, recv))
            .collect();

        self.check_address_conflicts(&motors)?;
        self.arm.extend(motors);
        Ok(())
    }

    /// 注册夹爪电机
    ///
    /// # 错误
    /// - `DriverError::Config`: 地址与已注册电机冲突
    pub fn add_gripper_motor(
        &mut self,
        motor_type: MotorType,
        send_can_id: u16,
        recv_can_id: u16,
    ) -> Result<(), DriverError> {
        let motor = Motor::new(motor_type, send_can_id, recv_can_id);
        self.check_address_conflicts(std::slice::from_ref(&motor))?;
        self.gripper.push(motor);
        Ok(())
    }

    /// 校验新电机的地址不与任何已注册电机冲突
    ///
    /// 发送地址和接收地址共用一个命名空间检查：接收端按
    /// 接收地址关联回复，任何重合都会破坏关联的唯一性。
    fn check_address_conflicts(&self, incoming: &[Motor]) -> Result<(), DriverError> {
        let mut seen: HashSet<u16> = self
            .motors()
            .flat_map(|m| [m.send_can_id(), m.recv_can_id()])
            .collect();

        for motor in incoming {
            for addr in [motor.send_can_id(), motor.recv_can_id()] {
                if !seen.insert(addr) {
                    return Err(DriverError::Config(format!(
                        "Duplicate CAN ID 0x{:02X} (motor send 0x{:02X}/recv 0x{:02X})",
                        addr,
                        motor.send_can_id(),
                        motor.recv_can_id()
                    )));
                }
            }
        }
        Ok(())
    }

    /// 机械臂电机（注册顺序）
    pub fn arm(&self) -> &[Motor] {
        &self.arm
    }

    /// 夹爪电机（注册顺序）
    pub fn gripper(&self) -> &[Motor] {
        &self.gripper
    }

    /// 全部电机，注册顺序（先 arm 后 gripper）
    pub fn motors(&self) -> impl Iterator<Item = &Motor> {
        self.arm.iter().chain(self.gripper.iter())
    }

    pub(crate) fn motors_mut(&mut self) -> impl Iterator<Item = &mut Motor> {
        self.arm.iter_mut().chain(self.gripper.iter_mut())
    }

    /// 电机总数
    pub fn len(&self) -> usize {
        self.arm.len() + self.gripper.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arm.is_empty() && self.gripper.is_empty()
    }

    /// 按接收 CAN ID 查找电机（用于入站帧关联）
    pub(crate) fn motor_by_recv_id_mut(&mut self, recv_can_id: u16) -> Option<&mut Motor> {
        self.motors_mut().find(|m| m.recv_can_id() == recv_can_id)
    }

    /// 设置全部电机的回调模式（纯状态变更，无 I/O）
    pub fn set_callback_mode_all(&mut self, mode: CallbackMode) {
        for motor in self.motors_mut() {
            motor.set_callback_mode(mode);
        }
    }

    /// 设置单个电机的回调模式
    ///
    /// 返回是否找到目标电机。
    pub fn set_callback_mode(&mut self, send_can_id: u16, mode: CallbackMode) -> bool {
        match self.motors_mut().find(|m| m.send_can_id() == send_can_id) {
            Some(motor) => {
                motor.set_callback_mode(mode);
                true
            },
            None => false,
        }
    }
}
