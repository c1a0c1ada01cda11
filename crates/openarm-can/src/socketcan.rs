//! SocketCAN CAN 适配器实现
//!
//! 基于 Linux 内核 SocketCAN 子系统的 CAN 通讯接口。
//!
//! ## 特性
//!
//! - 支持标准帧和扩展帧
//! - 支持 CAN-FD 高带宽灵活报文模式（可选）
//! - 自动过滤错误帧和远程帧
//!
//! ## 限制
//!
//! - **仅限 Linux 平台**：SocketCAN 是 Linux 内核特性
//! - **接口配置**：波特率等配置由系统工具（`ip link`）完成，不在应用层设置
//! - **权限要求**：可能需要 `dialout` 组权限或 `sudo`

use crate::{ArmFrame, CanAdapter, CanError};
use socketcan::{
    CanAnyFrame, CanDataFrame, CanFdFrame, CanFdSocket, CanFrame, CanSocket, EmbeddedFrame,
    ExtendedId, Id, Socket, StandardId,
};
use std::time::Duration;
use tracing::{trace, warn};

/// Linux 网络接口 UP 标志位（`/sys/class/net/<iface>/flags`）
const IFF_UP: u32 = 0x1;

/// 底层 socket：经典 CAN 2.0 或 CAN-FD
enum BusSocket {
    Classic(CanSocket),
    Fd(CanFdSocket),
}

/// SocketCAN 适配器
///
/// 实现 [`CanAdapter`] trait，提供 Linux 平台下的 SocketCAN 支持。
///
/// # 示例
///
/// ```no_run
/// use openarm_can::{CanAdapter, SocketCanAdapter};
/// use openarm_protocol::ArmFrame;
///
/// // 打开 CAN 接口（第二个参数选择 CAN-FD 模式）
/// let mut adapter = SocketCanAdapter::new("can0", false).unwrap();
///
/// let frame = ArmFrame::new_standard(0x01, &[1, 2, 3, 4]);
/// adapter.send(frame).unwrap();
/// let reply = adapter.receive().unwrap();
/// ```
pub struct SocketCanAdapter {
    socket: BusSocket,
    /// 接口名称（如 "can0"）
    interface: String,
    /// 读超时时间（用于 receive 方法）
    read_timeout: Duration,
}

impl SocketCanAdapter {
    /// 创建新的 SocketCAN 适配器
    ///
    /// 在打开 socket 之前，会检查接口是否存在且已启动（UP 状态）。
    /// 如果接口不存在或未启动，会返回清晰的错误信息，指导用户如何修复。
    ///
    /// # 参数
    /// - `interface`: CAN 接口名称（如 "can0" 或 "vcan0"）
    /// - `fd_mode`: 是否以 CAN-FD 灵活报文模式打开 socket。
    ///   帧编码不变（本协议只使用 8 字节载荷），仅影响总线带宽模式。
    ///
    /// # 错误
    /// - `CanError::Device`:
    ///   - 接口不存在（会提示创建命令）
    ///   - 接口存在但未启动（会提示启动命令）
    ///   - 无法打开接口
    /// - `CanError::Io`: IO 错误（如权限不足、系统调用失败）
    pub fn new(interface: impl Into<String>, fd_mode: bool) -> Result<Self, CanError> {
        let interface = interface.into();

        match check_interface_up(&interface) {
            Ok(true) => {
                trace!(
                    "CAN interface '{}' is UP, proceeding with initialization",
                    interface
                );
            },
            Ok(false) => {
                return Err(CanError::Device(format!(
                    "CAN interface '{}' exists but is not UP. Please start it first:\n  sudo ip link set up {}",
                    interface, interface
                )));
            },
            Err(e) => {
                return Err(e);
            },
        }

        let socket = if fd_mode {
            BusSocket::Fd(CanFdSocket::open(&interface).map_err(|e| {
                CanError::Device(format!(
                    "Failed to open CAN-FD interface '{}': {}",
                    interface, e
                ))
            })?)
        } else {
            BusSocket::Classic(CanSocket::open(&interface).map_err(|e| {
                CanError::Device(format!("Failed to open CAN interface '{}': {}", interface, e))
            })?)
        };

        Ok(Self {
            socket,
            interface,
            read_timeout: Duration::from_millis(100),
        })
    }

    /// 接口名称
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// 是否以 CAN-FD 模式打开
    pub fn is_fd_mode(&self) -> bool {
        matches!(self.socket, BusSocket::Fd(_))
    }

    /// 当前读超时时间
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// 将内部帧转换为 socketcan 帧所需的 Id
    fn encode_id(frame: &ArmFrame) -> Result<Id, CanError> {
        if frame.is_extended {
            ExtendedId::new(frame.id)
                .map(Id::Extended)
                .ok_or_else(|| CanError::Device(format!("Invalid extended CAN ID: 0x{:X}", frame.id)))
        } else {
            StandardId::new(frame.id as u16)
                .map(Id::Standard)
                .ok_or_else(|| CanError::Device(format!("Invalid standard CAN ID: 0x{:X}", frame.id)))
        }
    }
}

impl CanAdapter for SocketCanAdapter {
    fn send(&mut self, frame: ArmFrame) -> Result<(), CanError> {
        let id = Self::encode_id(&frame)?;

        match &self.socket {
            BusSocket::Classic(socket) => {
                let can_frame = CanFrame::new(id, frame.data_slice()).ok_or_else(|| {
                    CanError::Device(format!("Invalid CAN frame payload ({} bytes)", frame.len))
                })?;
                socket.write_frame(&can_frame)?;
            },
            BusSocket::Fd(socket) => {
                let fd_frame = CanFdFrame::new(id, frame.data_slice()).ok_or_else(|| {
                    CanError::Device(format!("Invalid CAN-FD frame payload ({} bytes)", frame.len))
                })?;
                socket.write_frame(&fd_frame)?;
            },
        }

        Ok(())
    }

    fn receive(&mut self) -> Result<ArmFrame, CanError> {
        // 循环跳过错误帧/远程帧，直到读到数据帧或超时
        loop {
            match &self.socket {
                BusSocket::Classic(socket) => {
                    match socket.read_frame_timeout(self.read_timeout) {
                        Ok(CanFrame::Data(data_frame)) => return Ok(to_arm_frame(&data_frame)),
                        Ok(CanFrame::Remote(_)) => continue,
                        Ok(CanFrame::Error(error_frame)) => {
                            warn!("CAN error frame received: {:?}, ignoring", error_frame);
                            continue;
                        },
                        Err(e) => return Err(map_read_error(e)),
                    }
                },
                BusSocket::Fd(socket) => match socket.read_frame_timeout(self.read_timeout) {
                    Ok(CanAnyFrame::Normal(data_frame)) => return Ok(to_arm_frame(&data_frame)),
                    Ok(CanAnyFrame::Fd(fd_frame)) => return Ok(fd_to_arm_frame(&fd_frame)),
                    Ok(CanAnyFrame::Remote(_)) => continue,
                    Ok(CanAnyFrame::Error(error_frame)) => {
                        warn!("CAN error frame received: {:?}, ignoring", error_frame);
                        continue;
                    },
                    Err(e) => return Err(map_read_error(e)),
                },
            }
        }
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }
}

/// 检查接口是否存在且处于 UP 状态
///
/// CAN 接口的 `operstate` 常为 `unknown`，因此读取 `flags`
/// 中的 `IFF_UP` 位来判断。
fn check_interface_up(interface: &str) -> Result<bool, CanError> {
    let flags_path = format!("/sys/class/net/{}/flags", interface);
    let flags_raw = match std::fs::read_to_string(&flags_path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CanError::Device(format!(
                "CAN interface '{}' does not exist. Create/attach it first, e.g.:\n  sudo ip link set {} type can bitrate 1000000",
                interface, interface
            )));
        },
        Err(e) => return Err(CanError::Io(e)),
    };

    let flags = flags_raw
        .trim()
        .strip_prefix("0x")
        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
        .unwrap_or(0);

    Ok(flags & IFF_UP != 0)
}

fn map_read_error(e: std::io::Error) -> CanError {
    match e.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => CanError::Timeout,
        _ => CanError::Io(e),
    }
}

fn to_arm_frame(frame: &CanDataFrame) -> ArmFrame {
    let (id, is_extended) = decode_id(frame.id());
    build_arm_frame(id, is_extended, frame.data())
}

fn fd_to_arm_frame(frame: &CanFdFrame) -> ArmFrame {
    // FD 帧最长 64 字节；本协议只使用前 8 字节
    let (id, is_extended) = decode_id(frame.id());
    build_arm_frame(id, is_extended, frame.data())
}

fn build_arm_frame(id: u32, is_extended: bool, payload: &[u8]) -> ArmFrame {
    let mut data = [0u8; 8];
    let len = payload.len().min(8);
    data[..len].copy_from_slice(&payload[..len]);

    ArmFrame {
        id,
        data,
        len: len as u8,
        is_extended,
    }
}

fn decode_id(id: Id) -> (u32, bool) {
    match id {
        Id::Standard(std_id) => (std_id.as_raw() as u32, false),
        Id::Extended(ext_id) => (ext_id.as_raw(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_interface_up_missing_interface() {
        let err = check_interface_up("definitely-not-a-can-interface").unwrap_err();
        match err {
            CanError::Device(msg) => {
                assert!(msg.contains("does not exist"));
                assert!(msg.contains("ip link"));
            },
            other => panic!("Expected Device error, got {:?}", other),
        }
    }

    #[test]
    fn test_map_read_error_timeout_kinds() {
        let would_block = std::io::Error::new(std::io::ErrorKind::WouldBlock, "wb");
        assert!(matches!(map_read_error(would_block), CanError::Timeout));

        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "to");
        assert!(matches!(map_read_error(timed_out), CanError::Timeout));

        let other = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(map_read_error(other), CanError::Io(_)));
    }
}
