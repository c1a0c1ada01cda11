//! OpenArm 驱动门面（对外 API）
//!
//! 持有 CAN 适配器与电机注册表，编排参数事务的完整周期：
//! 广播请求（issue 阶段）→ 限时收集（collect 阶段）→ 按接收
//! 地址关联回复并更新注册表。
//!
//! # 关键顺序约束
//!
//! 参数查询发出之前，每个目标电机的回调模式必须已切换为
//! `Param`（configure-before-trigger）。[`OpenArm::query_params`]
//! 把"切模式 → 广播 → 收集"封装为一步；分阶段方法
//! [`OpenArm::query_param_all`] / [`OpenArm::recv_all`] 保持公开，
//! 调用方自行负责顺序。

use crate::error::DriverError;
use crate::motor::{CallbackMode, Motor, MotorType};
use crate::registry::MotorRegistry;
use openarm_can::{CanAdapter, CanError};
use openarm_protocol::{
    ArmFrame, MotorOffCommand, MotorOnCommand, ParamReadCommand, ParamReply, ParamWriteCommand,
    StateReply,
};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// OpenArm 机械臂驱动
///
/// 单线程同步模型：事务严格串行，收集窗口为阻塞等待。
pub struct OpenArm<C: CanAdapter> {
    can: C,
    registry: MotorRegistry,
}

impl<C: CanAdapter> OpenArm<C> {
    /// 创建新的 OpenArm 实例
    ///
    /// # 参数
    /// - `can`: 已打开的 CAN 适配器
    pub fn new(can: C) -> Self {
        Self {
            can,
            registry: MotorRegistry::new(),
        }
    }

    /// 批量注册机械臂电机
    ///
    /// # 错误
    /// - `DriverError::Config`: 地址冲突或切片长度不一致；
    ///   发生在任何总线 I/O 之前
    pub fn init_arm_motors(
        &mut self,
        motor_types: &[MotorType],
        send_can_ids: &[u16],
        recv_can_ids: &[u16],
    ) -> Result<(), DriverError> {
        self.registry
            .add_arm_motors(motor_types, send_can_ids, recv_can_ids)
    }

    /// 注册夹爪电机
    pub fn init_gripper_motor(
        &mut self,
        motor_type: MotorType,
        send_can_id: u16,
        recv_can_id: u16,
    ) -> Result<(), DriverError> {
        self.registry
            .add_gripper_motor(motor_type, send_can_id, recv_can_id)
    }

    /// 机械臂电机（注册顺序）
    pub fn arm(&self) -> &[Motor] {
        self.registry.arm()
    }

    /// 夹爪电机（注册顺序）
    pub fn gripper(&self) -> &[Motor] {
        self.registry.gripper()
    }

    /// 电机注册表
    pub fn registry(&self) -> &MotorRegistry {
        &self.registry
    }

    /// 底层 CAN 适配器（可变借用）
    pub fn can_mut(&mut self) -> &mut C {
        &mut self.can
    }

    /// 设置全部电机的回调模式（纯状态变更，无 I/O）
    pub fn set_callback_mode_all(&mut self, mode: CallbackMode) {
        self.registry.set_callback_mode_all(mode);
    }

    /// 设置单个电机的回调模式
    pub fn set_callback_mode(&mut self, send_can_id: u16, mode: CallbackMode) -> bool {
        self.registry.set_callback_mode(send_can_id, mode)
    }

    /// 参数查询广播（issue 阶段）
    ///
    /// 按注册顺序向每个电机发送读取请求，即发即弃，不等待
    /// 逐电机确认。前置条件：目标电机已处于 `Param` 回调模式
    /// （本方法不切换模式）。
    ///
    /// # 错误
    /// - `DriverError::Can`: 传输层发送故障，事务中止
    pub fn query_param_all(&mut self, rid: u8) -> Result<(), DriverError> {
        for motor in self.registry.motors() {
            let frame = ParamReadCommand::new(motor.send_can_id(), rid).to_frame();
            trace!(
                "query rid {} -> motor 0x{:02X}",
                rid,
                motor.send_can_id()
            );
            self.can.send(frame)?;
        }
        Ok(())
    }

    /// 参数写入广播（issue 阶段）
    ///
    /// 与查询相同的顺序和即发即弃语义。写入不做数值范围校验，
    /// 操作员可见值的合法性（如控制模式编码）由上层会话负责；
    /// 写入是否生效只能通过随后的查询确认。
    ///
    /// # 错误
    /// - `DriverError::Can`: 传输层发送故障，事务中止
    pub fn write_param_all(&mut self, rid: u8, value: f64) -> Result<(), DriverError> {
        for motor in self.registry.motors() {
            let frame = ParamWriteCommand::new(motor.send_can_id(), rid, value).to_frame();
            debug!(
                "write rid {} = {} -> motor 0x{:02X}",
                rid,
                value,
                motor.send_can_id()
            );
            self.can.send(frame)?;
        }
        Ok(())
    }

    /// 限时收集入站帧（collect 阶段）
    ///
    /// 在 `deadline` 窗口内反复轮询总线；每一帧按接收 CAN ID
    /// 关联到电机，再按该电机当前回调模式解码：
    ///
    /// - `Param` 模式：按参数回复解码并记录到参数表
    /// - `State` 模式：按状态遥测解码并记录最近状态
    /// - 无匹配电机：按外来帧丢弃，不是错误
    /// - 畸形帧：记日志后跳过，不致命
    ///
    /// 部分电机未回复**不是错误**：调用方通过
    /// [`Motor::param`] 返回 `None` 来发现沉默的电机。
    /// 窗口内到达的回复会被处理；窗口结束后到达的不保证。
    ///
    /// # 错误
    /// - `DriverError::Can`: 传输层接收故障（超时除外）
    pub fn recv_all(&mut self, deadline: Duration) -> Result<(), DriverError> {
        let deadline_at = Instant::now() + deadline;

        loop {
            let remaining = deadline_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match self.can.receive_timeout(remaining) {
                Ok(frame) => self.dispatch_frame(&frame),
                // 整个剩余窗口内无帧到达，收集结束
                Err(CanError::Timeout) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// 完整参数查询事务
    ///
    /// "切模式 → 广播 → 收集"作为一步执行，保证模式切换先于
    /// 首个请求帧发出。调用结束后全部电机留在 `Param` 模式，
    /// 由调用方在恢复遥测前切回 `State`。
    pub fn query_params(&mut self, rid: u8, deadline: Duration) -> Result<(), DriverError> {
        self.set_callback_mode_all(CallbackMode::Param);
        self.query_param_all(rid)?;
        self.recv_all(deadline)
    }

    /// 使能全部电机
    pub fn enable_all(&mut self) -> Result<(), DriverError> {
        for motor in self.registry.motors() {
            self.can
                .send(MotorOnCommand::new(motor.send_can_id()).to_frame())?;
        }
        Ok(())
    }

    /// 失能全部电机
    ///
    /// 电机对失能指令仍会回报一帧状态遥测，调用方通常在之后
    /// 用较短的 [`OpenArm::recv_all`] 窗口吸收尾帧。
    pub fn disable_all(&mut self) -> Result<(), DriverError> {
        for motor in self.registry.motors() {
            self.can
                .send(MotorOffCommand::new(motor.send_can_id()).to_frame())?;
        }
        Ok(())
    }

    /// 按接收地址关联入站帧并更新注册表
    fn dispatch_frame(&mut self, frame: &ArmFrame) {
        let recv_id = match u16::try_from(frame.id()) {
            Ok(id) => id,
            // 超出 16 bit 的 ID 不可能是已注册电机
            Err(_) => {
                trace!("frame from extended ID 0x{:X}, discarding", frame.id());
                return;
            },
        };

        let Some(motor) = self.registry.motor_by_recv_id_mut(recv_id) else {
            trace!("frame from unknown source 0x{:02X}, discarding", recv_id);
            return;
        };

        match motor.callback_mode() {
            CallbackMode::Param => match ParamReply::try_from(frame) {
                Ok(reply) => {
                    trace!(
                        "param reply from 0x{:02X}: rid {} = {}",
                        recv_id,
                        reply.rid,
                        reply.value
                    );
                    motor.record_param(reply.rid, reply.value);
                },
                Err(e) => warn!("malformed param reply from 0x{:02X}: {}, skipping", recv_id, e),
            },
            CallbackMode::State => match StateReply::try_from(frame) {
                Ok(state) => motor.record_state(state),
                Err(e) => warn!("malformed state frame from 0x{:02X}: {}, skipping", recv_id, e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openarm_protocol::constants::{rid, CMD_PARAM_READ};
    use openarm_protocol::ArmFrame;
    use std::collections::VecDeque;

    /// 脚本化 CAN 适配器：记录发送帧，按队列回放接收帧
    struct MockCan {
        sent: Vec<ArmFrame>,
        rx_queue: VecDeque<ArmFrame>,
    }

    impl MockCan {
        fn new() -> Self {
            Self {
                sent: Vec::new(),
                rx_queue: VecDeque::new(),
            }
        }

        fn push_reply(&mut self, frame: ArmFrame) {
            self.rx_queue.push_back(frame);
        }
    }

    impl CanAdapter for MockCan {
        fn send(&mut self, frame: ArmFrame) -> Result<(), CanError> {
            self.sent.push(frame);
            Ok(())
        }

        fn receive(&mut self) -> Result<ArmFrame, CanError> {
            self.rx_queue.pop_front().ok_or(CanError::Timeout)
        }
    }

    fn param_reply_frame(recv_id: u16, send_id: u16, rid: u8, value: u32) -> ArmFrame {
        let mut data = [0u8; 8];
        data[0] = (send_id & 0xFF) as u8;
        data[1] = (send_id >> 8) as u8;
        data[2] = CMD_PARAM_READ;
        data[3] = rid;
        data[4..8].copy_from_slice(&value.to_le_bytes());
        ArmFrame::new_standard(recv_id, &data)
    }

    fn openarm_with_two_motors() -> OpenArm<MockCan> {
        let mut openarm = OpenArm::new(MockCan::new());
        openarm
            .init_arm_motors(
                &[MotorType::Dm4310, MotorType::Dm4310],
                &[0x01, 0x02],
                &[0x11, 0x12],
            )
            .unwrap();
        openarm
    }

    const DEADLINE: Duration = Duration::from_millis(50);

    #[test]
    fn test_query_param_all_sends_in_registration_order() {
        let mut openarm = openarm_with_two_motors();
        openarm.set_callback_mode_all(CallbackMode::Param);
        openarm.query_param_all(rid::CTRL_MODE).unwrap();

        let sent = &openarm.can.sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].id(), 0x01);
        assert_eq!(sent[1].id(), 0x02);
        assert_eq!(sent[0].data[2], CMD_PARAM_READ);
        assert_eq!(sent[0].data[3], rid::CTRL_MODE);
    }

    #[test]
    fn test_recv_all_records_param_replies() {
        let mut openarm = openarm_with_two_motors();
        openarm.set_callback_mode_all(CallbackMode::Param);
        openarm
            .can
            .push_reply(param_reply_frame(0x11, 0x01, rid::CTRL_MODE, 1));
        openarm
            .can
            .push_reply(param_reply_frame(0x12, 0x02, rid::CTRL_MODE, 3));

        openarm.recv_all(DEADLINE).unwrap();

        assert_eq!(openarm.arm()[0].param(rid::CTRL_MODE), Some(1.0));
        assert_eq!(openarm.arm()[1].param(rid::CTRL_MODE), Some(3.0));
    }

    #[test]
    fn test_silent_motor_stays_unobserved() {
        let mut openarm = openarm_with_two_motors();
        openarm.set_callback_mode_all(CallbackMode::Param);
        openarm
            .can
            .push_reply(param_reply_frame(0x11, 0x01, rid::CTRL_MODE, 2));

        openarm.query_param_all(rid::CTRL_MODE).unwrap();
        // 部分电机未回复不是错误
        openarm.recv_all(DEADLINE).unwrap();

        assert_eq!(openarm.arm()[0].param(rid::CTRL_MODE), Some(2.0));
        assert_eq!(openarm.arm()[1].param(rid::CTRL_MODE), None);
    }

    #[test]
    fn test_foreign_frame_discarded() {
        let mut openarm = openarm_with_two_motors();
        openarm.set_callback_mode_all(CallbackMode::Param);
        // 来源地址未注册
        openarm
            .can
            .push_reply(param_reply_frame(0x42, 0x42, rid::CTRL_MODE, 4));

        openarm.recv_all(DEADLINE).unwrap();

        assert!(openarm.registry().motors().all(|m| m.param(rid::CTRL_MODE).is_none()));
    }

    #[test]
    fn test_state_mode_motor_not_updated_by_param_frame() {
        let mut openarm = openarm_with_two_motors();
        // 电机 0x02 仍处于 State 模式
        openarm.set_callback_mode(0x01, CallbackMode::Param);
        openarm
            .can
            .push_reply(param_reply_frame(0x12, 0x02, rid::CTRL_MODE, 1));

        openarm.recv_all(DEADLINE).unwrap();

        // 帧按遥测解码，参数表不得被更新
        assert_eq!(openarm.arm()[1].param(rid::CTRL_MODE), None);
        // 同一帧被记录为（无意义的）原始遥测
        assert!(openarm.arm()[1].state().is_some());
    }

    #[test]
    fn test_malformed_frame_skipped() {
        let mut openarm = openarm_with_two_motors();
        openarm.set_callback_mode_all(CallbackMode::Param);
        // 截断帧：长度不足 8 字节
        openarm.can.push_reply(ArmFrame::new_standard(0x11, &[0x01, 0x00]));
        openarm
            .can
            .push_reply(param_reply_frame(0x12, 0x02, rid::CTRL_MODE, 2));

        // 畸形帧不致命，后续帧照常处理
        openarm.recv_all(DEADLINE).unwrap();
        assert_eq!(openarm.arm()[0].param(rid::CTRL_MODE), None);
        assert_eq!(openarm.arm()[1].param(rid::CTRL_MODE), Some(2.0));
    }

    #[test]
    fn test_write_param_all_transmits_any_value() {
        let mut openarm = openarm_with_two_motors();
        // 引擎不校验范围：0 是保留值也照发
        openarm.write_param_all(rid::CTRL_MODE, 0.0).unwrap();
        assert_eq!(openarm.can.sent.len(), 2);
        assert_eq!(&openarm.can.sent[0].data[4..8], &0u32.to_le_bytes());
    }

    #[test]
    fn test_disable_all_broadcasts_off_command() {
        let mut openarm = openarm_with_two_motors();
        openarm.disable_all().unwrap();
        assert_eq!(openarm.can.sent.len(), 2);
        for frame in &openarm.can.sent {
            assert_eq!(frame.data[7], 0xFD);
        }
    }

    #[test]
    fn test_send_fault_aborts_transaction() {
        struct FailingCan;
        impl CanAdapter for FailingCan {
            fn send(&mut self, _frame: ArmFrame) -> Result<(), CanError> {
                Err(CanError::Device("bus fault".to_string()))
            }
            fn receive(&mut self) -> Result<ArmFrame, CanError> {
                Err(CanError::Timeout)
            }
        }

        let mut openarm = OpenArm::new(FailingCan);
        openarm
            .init_arm_motors(&[MotorType::Dm4310], &[0x01], &[0x11])
            .unwrap();
        let err = openarm.query_param_all(rid::CTRL_MODE).unwrap_err();
        assert!(err.is_communication());
    }
}
