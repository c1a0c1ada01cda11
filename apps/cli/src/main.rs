//! # OpenArm CLI
//!
//! OpenArm 机械臂控制模式命令行工具。
//!
//! ```bash
//! # 查询全部电机的控制模式
//! openarm-cli query-mode can0
//!
//! # 查询并设置控制模式（交互输入目标值）
//! openarm-cli set-mode can0 --fd
//!
//! # 非交互设置
//! openarm-cli set-mode can0 --mode 2
//! ```

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;
mod validation;

use commands::{QueryModeCommand, SetModeCommand};
use openarm_driver::DriverError;

/// OpenArm CLI - 机械臂控制模式工具
#[derive(Parser, Debug)]
#[command(name = "openarm-cli")]
#[command(about = "Query and set OpenArm motor control modes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 查询全部电机的控制模式
    QueryMode {
        #[command(flatten)]
        args: QueryModeCommand,
    },

    /// 查询并设置控制模式，随后复查
    SetMode {
        #[command(flatten)]
        args: SetModeCommand,
    },
}

fn main() -> ExitCode {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("openarm_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::QueryMode { args } => commands::query_mode::run(&args),
        Commands::SetMode { args } => commands::set_mode::run(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            // 传输层故障与配置错误用不同的非零状态区分
            if is_communication_error(&err) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        },
    }
}

fn is_communication_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DriverError>()
        .is_some_and(DriverError::is_communication)
}
