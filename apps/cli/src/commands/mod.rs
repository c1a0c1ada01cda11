//! 子命令实现与共享会话辅助
//!
//! 电机布局表是静态配置数据：机械臂 7 个电机
//! （发送 0x01..=0x07 / 接收 0x11..=0x17），夹爪 1 个
//! （0x08/0x18）。地址唯一性由注册表在初始化时校验。

pub mod query_mode;
pub mod set_mode;

pub use query_mode::QueryModeCommand;
pub use set_mode::SetModeCommand;

use anyhow::Result;
use openarm_can::SocketCanAdapter;
use openarm_driver::{CallbackMode, MotorType, OpenArm};
use openarm_protocol::constants::rid;
use openarm_protocol::ControlMode;
use std::time::Duration;
use tracing::warn;

/// 参数查询收集窗口
pub const QUERY_DEADLINE: Duration = Duration::from_millis(2000);

/// 失能后遥测尾帧的吸收窗口
pub const SETTLE_DEADLINE: Duration = Duration::from_millis(1000);

/// 机械臂电机型号表（配置顺序即显示顺序）
const ARM_MOTOR_TYPES: [MotorType; 7] = [
    MotorType::Dm8009,
    MotorType::Dm8009,
    MotorType::Dm4340,
    MotorType::Dm4340,
    MotorType::Dm4310,
    MotorType::Dm4310,
    MotorType::Dm4310,
];
const ARM_SEND_CAN_IDS: [u16; 7] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
const ARM_RECV_CAN_IDS: [u16; 7] = [0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];

const GRIPPER_MOTOR_TYPE: MotorType = MotorType::Dm4310;
const GRIPPER_SEND_CAN_ID: u16 = 0x08;
const GRIPPER_RECV_CAN_ID: u16 = 0x18;

/// 打印可设置的控制模式列表
pub fn print_available_modes() {
    println!("Available modes:");
    for code in ControlMode::settable_codes() {
        println!("{}:{}", code, ControlMode::label(code));
    }
}

/// 打开 CAN 接口并注册标准电机布局
pub fn init_openarm(interface: &str, fd_mode: bool) -> Result<OpenArm<SocketCanAdapter>> {
    println!("Initializing OpenArm CAN...");
    println!("Interface: {interface}");
    println!("Flexible Data Mode: {fd_mode}");

    let adapter = SocketCanAdapter::new(interface, fd_mode)?;
    let mut openarm = OpenArm::new(adapter);

    openarm.init_arm_motors(&ARM_MOTOR_TYPES, &ARM_SEND_CAN_IDS, &ARM_RECV_CAN_IDS)?;

    println!("Initializing gripper...");
    openarm.init_gripper_motor(GRIPPER_MOTOR_TYPE, GRIPPER_SEND_CAN_ID, GRIPPER_RECV_CAN_ID)?;

    Ok(openarm)
}

/// 查询控制模式并逐电机打印
///
/// 从未回复的电机显示 `-- (no response)`，不显示默认值 0。
pub fn query_and_print_modes(openarm: &mut OpenArm<SocketCanAdapter>) -> Result<()> {
    openarm.query_params(rid::CTRL_MODE, QUERY_DEADLINE)?;

    for motor in openarm.arm() {
        print_motor_mode("Arm Motor", motor);
    }
    for motor in openarm.gripper() {
        print_motor_mode("Gripper Motor", motor);
    }

    Ok(())
}

fn print_motor_mode(group_label: &str, motor: &openarm_driver::Motor) {
    match motor.param(rid::CTRL_MODE) {
        Some(value) => {
            let code = value.round() as u8;
            println!(
                "{}: 0x{:02X} Motor Control Mode: {} - {}",
                group_label,
                motor.send_can_id(),
                code,
                ControlMode::label(code)
            );
        },
        None => {
            println!(
                "{}: 0x{:02X} Motor Control Mode: -- (no response)",
                group_label,
                motor.send_can_id()
            );
        },
    }
}

/// 会话收尾：恢复遥测模式并失能全部电机
///
/// 尽力而为：清理阶段的传输故障只上报，不改变主操作的结果。
pub fn shutdown(openarm: &mut OpenArm<SocketCanAdapter>) {
    println!("Disabling motors");
    openarm.set_callback_mode_all(CallbackMode::State);

    if let Err(e) = openarm
        .disable_all()
        .and_then(|()| openarm.recv_all(SETTLE_DEADLINE))
    {
        warn!("cleanup failed: {}", e);
        eprintln!("Warning: failed to disable motors cleanly: {e}");
    }
}
