//! 驱动层错误类型定义

use openarm_can::CanError;
use openarm_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// CAN 驱动错误
    #[error("CAN driver error: {0}")]
    Can(#[from] CanError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 电机配置错误（地址冲突、数量不匹配）
    #[error("Configuration error: {0}")]
    Config(String),

    /// 无效输入
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DriverError {
    /// 是否为传输层故障
    ///
    /// 会话层据此决定退出码：传输故障与配置错误以不同的
    /// 非零状态上报。
    pub fn is_communication(&self) -> bool {
        matches!(self, DriverError::Can(_))
    }
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use openarm_can::CanError;
    use openarm_protocol::ProtocolError;

    /// 测试 DriverError 的 Display 实现
    #[test]
    fn test_driver_error_display() {
        let driver_error = DriverError::Can(CanError::Timeout);
        let msg = format!("{}", driver_error);
        assert!(msg.contains("Read timeout") || msg.contains("CAN"));

        let protocol_error = ProtocolError::InvalidLength {
            expected: 8,
            actual: 4,
        };
        let driver_error = DriverError::Protocol(protocol_error);
        let msg = format!("{}", driver_error);
        assert!(msg.contains("Invalid frame length"));

        let driver_error = DriverError::Config("duplicate CAN ID".to_string());
        let msg = format!("{}", driver_error);
        assert!(msg.contains("duplicate CAN ID"));
    }

    /// 测试 From<CanError> 转换
    #[test]
    fn test_from_can_error() {
        let driver_error: DriverError = CanError::Timeout.into();
        assert!(matches!(driver_error, DriverError::Can(CanError::Timeout)));
        assert!(driver_error.is_communication());
    }

    /// 测试 From<ProtocolError> 转换
    #[test]
    fn test_from_protocol_error() {
        let protocol_error = ProtocolError::InvalidCommand { command: 0x99 };
        let driver_error: DriverError = protocol_error.into();
        match driver_error {
            DriverError::Protocol(ProtocolError::InvalidCommand { command }) => {
                assert_eq!(command, 0x99)
            },
            _ => panic!("Expected Protocol variant"),
        }
        let config = DriverError::Config("x".into());
        assert!(!config.is_communication());
    }
}
