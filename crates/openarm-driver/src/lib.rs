//! 驱动层模块
//!
//! 本模块提供 OpenArm 机械臂的参数事务驱动，包括：
//! - 电机注册表（arm/gripper 两组，地址全局唯一）
//! - 回调模式管理（遥测 / 参数回复的解码选择）
//! - 参数事务引擎（广播请求 → 限时收集 → 按地址关联）
//! - 使能/失能指令广播
//!
//! # 并发模型
//!
//! 单线程同步阻塞：事务严格串行，无内部并行。引入线程或
//! 异步 I/O 的调用方需要自行在注册表变更外加互斥边界，并把
//! "先切模式后查询"保持为 happens-before 关系。

mod error;
mod motor;
mod openarm;
mod registry;

pub use error::DriverError;
pub use motor::{CallbackMode, Motor, MotorType};
pub use openarm::OpenArm;
pub use registry::MotorRegistry;
