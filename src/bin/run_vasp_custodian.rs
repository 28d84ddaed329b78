//! # run_vasp_custodian - 外部纠错运行器 shim
//!
//! 解析设置文件，把控制权交给外部纠错运行器（或直接执行 VASP 命令），
//! 并把子进程的退出码作为自身退出码。

use anyhow::Context;
use vaspilot::custodian;
use vaspilot::utils::output;

fn main() {
    let code = match launch() {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            1
        }
    };
    std::process::exit(code);
}

fn launch() -> anyhow::Result<i32> {
    let path = custodian::resolve_settings_path()?;
    let settings = custodian::CustodianSettings::load(&path)
        .with_context(|| format!("loading custodian settings from {}", path.display()))?;
    let code = custodian::run(&settings, &path)?;
    Ok(code)
}
