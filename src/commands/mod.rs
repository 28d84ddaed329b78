//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `calculators/`, `copilot/`, `parsers/`, `utils/`
//! - 子模块: incar, check, gulp, presets

pub mod check;
pub mod gulp;
pub mod incar;
pub mod presets;

use crate::cli::Commands;
use crate::copilot::Change;
use crate::error::Result;
use tabled::{Table, Tabled};

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Incar(args) => incar::execute(args),
        Commands::Check(args) => check::execute(args),
        Commands::Gulp(args) => gulp::execute(args),
        Commands::Presets(args) => presets::execute(args),
    }
}

/// co-pilot 修正表格行
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Flag")]
    flag: String,
    #[tabled(rename = "Correction")]
    note: String,
}

/// 打印 co-pilot 修正表格
pub(crate) fn print_changes_table(changes: &[Change]) {
    let rows: Vec<ChangeRow> = changes
        .iter()
        .map(|c| ChangeRow {
            flag: c.flag.to_uppercase(),
            note: c.note.clone(),
        })
        .collect();

    let table = Table::new(&rows);
    println!("{}", table);
}
