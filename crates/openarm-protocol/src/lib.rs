//! # OpenArm Protocol
//!
//! OpenArm 机械臂 CAN 总线协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量定义（寄存器 RID、指令魔数）
//! - `mode`: 电机控制模式编码
//! - `control`: 控制帧构建（参数读写、使能/失能）
//! - `feedback`: 反馈帧解析（参数回复、状态遥测）
//!
//! ## 字节序
//!
//! 寄存器数值采用 Intel (LSB) 低位在前（小端字节序）。

pub mod constants;
pub mod control;
pub mod feedback;
pub mod mode;

// 重新导出常用类型
pub use constants::*;
pub use control::*;
pub use feedback::*;
pub use mode::*;

/// CAN 2.0 标准帧的统一抽象
///
/// # 设计目的
///
/// `ArmFrame` 是协议层和硬件层之间的中间抽象，提供：
/// - **层次解耦**：协议层不依赖底层 CAN 实现（SocketCAN）
/// - **统一接口**：上层通过 `CanAdapter` trait 使用统一的帧类型
/// - **类型安全**：编译时保证帧格式正确，避免原始字节操作错误
///
/// # 设计特性
///
/// - **Copy trait**：零成本复制，适合高频 CAN 场景
/// - **固定 8 字节**：避免堆分配；CAN-FD 模式下仍只使用前 8 字节
/// - **无生命周期**：自包含数据结构，简化 API
///
/// # 转换示例
///
/// ```rust
/// use openarm_protocol::ArmFrame;
///
/// let frame = ArmFrame::new_standard(0x11, &[1, 2, 3, 4]);
/// assert_eq!(frame.id(), 0x11);
/// assert_eq!(frame.data_slice(), &[1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmFrame {
    /// CAN ID（标准帧或扩展帧）
    pub id: u32,

    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub data: [u8; 8],

    /// 有效数据长度 (0-8)
    pub len: u8,

    /// 是否为扩展帧（29-bit ID）
    pub is_extended: bool,
}

impl ArmFrame {
    /// 创建标准帧
    pub fn new_standard(id: u16, data: &[u8]) -> Self {
        Self::new(id as u32, data, false)
    }

    /// 创建扩展帧
    pub fn new_extended(id: u32, data: &[u8]) -> Self {
        Self::new(id, data, true)
    }

    /// 通用构造器
    fn new(id: u32, data: &[u8], is_extended: bool) -> Self {
        let mut fixed_data = [0u8; 8];
        let len = data.len().min(8);
        fixed_data[..len].copy_from_slice(&data[..len]);

        Self {
            id,
            data: fixed_data,
            len: len as u8,
            is_extended,
        }
    }

    /// 获取数据切片（只包含有效数据）
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// 获取 CAN ID
    pub fn id(&self) -> u32 {
        self.id
    }
}

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid command byte: 0x{command:02X}")]
    InvalidCommand { command: u8 },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u8 },
}
