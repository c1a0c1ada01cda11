//! 电机记录与回调模式定义

use openarm_protocol::StateReply;
use std::collections::HashMap;
use std::fmt;

/// 回调模式
///
/// # 模式说明
///
/// 总线协议对周期状态遥测和按需参数回复复用同一种帧外形，
/// 帧本身无法区分类别。本标志决定**下一帧**来自该电机的
/// 报文如何解码：
///
/// - **State**: 按状态遥测解码（默认）
/// - **Param**: 按参数回复解码
///
/// 发出参数查询之前，目标电机必须已切换到 `Param`，
/// 否则其回复会被误解码或丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CallbackMode {
    /// 状态遥测模式（默认）
    #[default]
    State = 0,

    /// 参数回复模式
    Param = 1,
}

impl CallbackMode {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 State 模式。
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Param,
            _ => Self::State,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 是否为参数回复模式
    pub fn is_param(self) -> bool {
        self == Self::Param
    }

    /// 是否为状态遥测模式
    pub fn is_state(self) -> bool {
        self == Self::State
    }
}

/// 电机型号标签
///
/// 驱动层只携带型号用于配置和显示；量程换算属于电机模型层，
/// 不在本层实现。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorType {
    Dm4310,
    Dm4340,
    Dm8009,
}

impl fmt::Display for MotorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorType::Dm4310 => write!(f, "DM4310"),
            MotorType::Dm4340 => write!(f, "DM4340"),
            MotorType::Dm8009 => write!(f, "DM8009"),
        }
    }
}

/// 单个电机的记录
///
/// 身份由 (发送 CAN ID, 接收 CAN ID) 构成；参数表保存每个寄存器
/// 最近一次观测到的值，不保留历史。
#[derive(Debug, Clone)]
pub struct Motor {
    motor_type: MotorType,
    send_can_id: u16,
    recv_can_id: u16,
    callback_mode: CallbackMode,
    /// RID -> 最近观测值
    params: HashMap<u8, f64>,
    /// 最近一帧状态遥测（原始计数）
    state: Option<StateReply>,
}

impl Motor {
    pub fn new(motor_type: MotorType, send_can_id: u16, recv_can_id: u16) -> Self {
        Self {
            motor_type,
            send_can_id,
            recv_can_id,
            callback_mode: CallbackMode::default(),
            params: HashMap::new(),
            state: None,
        }
    }

    pub fn motor_type(&self) -> MotorType {
        self.motor_type
    }

    pub fn send_can_id(&self) -> u16 {
        self.send_can_id
    }

    pub fn recv_can_id(&self) -> u16 {
        self.recv_can_id
    }

    pub fn callback_mode(&self) -> CallbackMode {
        self.callback_mode
    }

    pub fn set_callback_mode(&mut self, mode: CallbackMode) {
        self.callback_mode = mode;
    }

    /// 读取寄存器最近观测值
    ///
    /// `None` 表示"尚未观测到"，是一等结果而不是错误：
    /// 从未回复的电机必须与回复了 0 的电机可区分。
    pub fn param(&self, rid: u8) -> Option<f64> {
        self.params.get(&rid).copied()
    }

    /// 记录寄存器观测值（覆盖旧值）
    pub fn record_param(&mut self, rid: u8, value: f64) {
        self.params.insert(rid, value);
    }

    /// 最近一帧状态遥测
    pub fn state(&self) -> Option<&StateReply> {
        self.state.as_ref()
    }

    /// 记录状态遥测（覆盖旧值）
    pub fn record_state(&mut self, state: StateReply) {
        self.state = Some(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openarm_protocol::constants::rid;

    #[test]
    fn test_callback_mode_conversions() {
        assert_eq!(CallbackMode::from_u8(0), CallbackMode::State);
        assert_eq!(CallbackMode::from_u8(1), CallbackMode::Param);
        assert_eq!(CallbackMode::from_u8(255), CallbackMode::State); // 无效值

        assert_eq!(CallbackMode::State.as_u8(), 0);
        assert_eq!(CallbackMode::Param.as_u8(), 1);

        assert!(CallbackMode::Param.is_param());
        assert!(!CallbackMode::Param.is_state());
        assert!(CallbackMode::State.is_state());
    }

    #[test]
    fn test_default_mode_is_state() {
        let motor = Motor::new(MotorType::Dm4310, 0x01, 0x11);
        assert_eq!(motor.callback_mode(), CallbackMode::State);
    }

    #[test]
    fn test_param_none_until_recorded() {
        let mut motor = Motor::new(MotorType::Dm4340, 0x03, 0x13);
        assert_eq!(motor.param(rid::CTRL_MODE), None);

        motor.record_param(rid::CTRL_MODE, 0.0);
        // 回复了 0 的电机与从未回复的电机必须可区分
        assert_eq!(motor.param(rid::CTRL_MODE), Some(0.0));
    }

    #[test]
    fn test_record_param_overwrites() {
        let mut motor = Motor::new(MotorType::Dm8009, 0x01, 0x11);
        motor.record_param(rid::CTRL_MODE, 1.0);
        motor.record_param(rid::CTRL_MODE, 3.0);
        assert_eq!(motor.param(rid::CTRL_MODE), Some(3.0));
        // 其他寄存器不受影响
        assert_eq!(motor.param(rid::TIMEOUT), None);
    }

    #[test]
    fn test_motor_type_display() {
        assert_eq!(MotorType::Dm4310.to_string(), "DM4310");
        assert_eq!(MotorType::Dm8009.to_string(), "DM8009");
    }
}
