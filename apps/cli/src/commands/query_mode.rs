//! `query-mode` 子命令：查询全部电机的控制模式并打印

use anyhow::Result;
use clap::Args;

use super::{init_openarm, print_available_modes, query_and_print_modes, shutdown};

#[derive(Args, Debug)]
pub struct QueryModeCommand {
    /// CAN 接口名称（如 can0）
    pub interface: String,

    /// 以 CAN-FD 灵活报文模式打开接口
    #[arg(long)]
    pub fd: bool,
}

pub fn run(args: &QueryModeCommand) -> Result<()> {
    println!("=== Query Control Mode ===");
    println!("Query robot motor control mode");
    print_available_modes();

    let mut openarm = init_openarm(&args.interface, args.fd)?;

    let result = query_and_print_modes(&mut openarm);

    // 清理必须执行，即使查询失败
    shutdown(&mut openarm);

    result
}
