//! # OpenArm CAN Adapter Layer
//!
//! CAN 硬件抽象层，提供统一的 CAN 接口抽象。

use std::time::Duration;
use thiserror::Error;

// 重新导出 openarm-protocol 中的 ArmFrame
pub use openarm_protocol::ArmFrame;

#[cfg(target_os = "linux")]
pub mod socketcan;

#[cfg(target_os = "linux")]
pub use socketcan::SocketCanAdapter;

/// CAN 适配层统一错误类型
#[derive(Error, Debug)]
pub enum CanError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(String),
    #[error("Read timeout")]
    Timeout,
}

/// CAN 适配器统一接口
///
/// `send` 为即发即弃语义；`receive` 阻塞至有帧可读或超时。
/// 读超时通过 `set_receive_timeout` 设置，超时以
/// [`CanError::Timeout`] 上报，由调用方决定是否为错误。
pub trait CanAdapter {
    fn send(&mut self, frame: ArmFrame) -> Result<(), CanError>;
    fn receive(&mut self) -> Result<ArmFrame, CanError>;
    fn set_receive_timeout(&mut self, _timeout: Duration) {}
    fn receive_timeout(&mut self, timeout: Duration) -> Result<ArmFrame, CanError> {
        self.set_receive_timeout(timeout);
        self.receive()
    }
    fn try_receive(&mut self) -> Result<Option<ArmFrame>, CanError> {
        match self.receive_timeout(Duration::ZERO) {
            Ok(frame) => Ok(Some(frame)),
            Err(CanError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
