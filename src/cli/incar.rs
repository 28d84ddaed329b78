//! # incar 子命令参数
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs`, `commands/incar.rs` 使用

use clap::Args;
use std::path::PathBuf;

/// incar 命令参数
#[derive(Args)]
pub struct IncarArgs {
    /// Structure file (POSCAR/CONTCAR)
    pub structure: PathBuf,

    /// Preset name (BulkSet, SlabSet, ...) or path to a preset YAML file
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Override a flag, e.g. --set ENCUT=600 (repeatable)
    #[arg(short = 's', long = "set", value_name = "FLAG=VALUE")]
    pub set: Vec<String>,

    /// Write INCAR/KPOINTS into this directory instead of just previewing
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Treat the structure as a non-periodic cluster
    #[arg(long)]
    pub cluster: bool,

    /// Disable the INCAR co-pilot for this run
    #[arg(long)]
    pub no_copilot: bool,

    /// Use the plain VASP command instead of the correction-runner shim
    #[arg(long)]
    pub no_custodian: bool,
}
