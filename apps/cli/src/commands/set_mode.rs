//! `set-mode` 子命令：查询、设置、复查控制模式
//!
//! 会话顺序：先查询并显示当前模式；读取操作员目标值并校验
//! （开区间，两端保留值拒绝）；合法则写入并再次查询确认，
//! 非法则跳过写入和复查，仅报告被拒绝的值。无论哪个分支，
//! 收尾动作（恢复遥测模式 + 失能）都会执行。

use anyhow::{Context, Result};
use clap::Args;
use openarm_protocol::constants::rid;
use openarm_protocol::{ControlMode, CONTROL_MODE_MAX, CONTROL_MODE_MIN};
use std::io::{self, Write};

use super::{init_openarm, print_available_modes, query_and_print_modes, shutdown, QUERY_DEADLINE};
use crate::validation::ModeValidator;

#[derive(Args, Debug)]
pub struct SetModeCommand {
    /// CAN 接口名称（如 can0）
    pub interface: String,

    /// 以 CAN-FD 灵活报文模式打开接口
    #[arg(long)]
    pub fd: bool,

    /// 目标控制模式编码（缺省时交互输入）
    #[arg(long)]
    pub mode: Option<i64>,
}

pub fn run(args: &SetModeCommand) -> Result<()> {
    println!("=== Set Control Mode ===");
    println!("Query and set robot motor control mode");
    print_available_modes();

    let mut openarm = init_openarm(&args.interface, args.fd)?;

    let result = query_set_requery(args, &mut openarm);

    // 清理必须执行，即使校验拒绝或查询失败
    shutdown(&mut openarm);

    result
}

fn query_set_requery(
    args: &SetModeCommand,
    openarm: &mut openarm_driver::OpenArm<openarm_can::SocketCanAdapter>,
) -> Result<()> {
    println!("=== Previous control modes ===");
    query_and_print_modes(openarm)?;

    let target = match args.mode {
        Some(code) => Some(code),
        None => prompt_target_mode()?,
    };

    let validator = ModeValidator::new();
    match target.map(|code| validator.validate(code)) {
        Some(Ok(code)) => {
            println!(
                "Setting control modes to: {} - {}",
                code,
                ControlMode::label(code)
            );
            openarm.write_param_all(rid::CTRL_MODE, code as f64)?;
            // 吸收写入回显（电机仍处于 Param 模式）
            openarm.recv_all(QUERY_DEADLINE)?;

            println!("=== Current control modes ===");
            query_and_print_modes(openarm)?;
        },
        Some(Err(rejected)) => {
            // 非法输入在本地恢复：跳过写入和复查，继续走清理
            println!("{rejected}");
        },
        None => {
            println!("No target control mode entered, skipping write");
        },
    }

    Ok(())
}

/// 从标准输入读取目标模式编码
///
/// 无法解析为整数的输入按"未输入"处理（`None`），
/// 交给调用方按非法输入路径走清理。
fn prompt_target_mode() -> Result<Option<i64>> {
    print!(
        "Target Control Mode (int - {} < value < {}): ",
        CONTROL_MODE_MIN, CONTROL_MODE_MAX
    );
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read target control mode")?;

    Ok(line.trim().parse::<i64>().ok())
}
