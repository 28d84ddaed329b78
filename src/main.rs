//! # Vaspilot - DFT 计算输入装配工具
//!
//! ## 子命令
//! - `incar`   - 由结构 + 预设装配 VASP 输入（INCAR/KPOINTS）
//! - `check`   - 检查既有 INCAR 的 flag 约束
//! - `gulp`    - 装配 GULP 关键词/选项行
//! - `presets` - 列出或展示内置预设

use clap::Parser;
use vaspilot::cli::Cli;
use vaspilot::{commands, utils};

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
