//! # check 子命令参数
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs`, `commands/check.rs` 使用

use clap::Args;
use std::path::PathBuf;

/// check 命令参数
#[derive(Args)]
pub struct CheckArgs {
    /// INCAR file to check
    pub incar: PathBuf,

    /// Structure file (POSCAR/CONTCAR) the INCAR belongs to
    pub structure: PathBuf,

    /// KPOINTS file for mesh-aware checks (default: KPOINTS next to the INCAR)
    #[arg(short, long)]
    pub kpoints: Option<PathBuf>,

    /// Rewrite the INCAR in place with the corrections applied
    #[arg(long)]
    pub fix: bool,
}
