//! # check 命令：检查既有 INCAR
//!
//! 对既有 INCAR 只跑 co-pilot，报告将会发生的修正；`--fix` 时原地改写。
//! 未指定 KPOINTS 时尝试读取 INCAR 同目录的 `KPOINTS` 文件，
//! 找不到则按 Γ 点网格做保守检查。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `copilot/`, `parsers/`, `utils/output.rs`

use crate::cli::check::CheckArgs;
use crate::copilot::{self, KpointMesh};
use crate::error::Result;
use crate::parsers::{incar, kpoints, poscar};
use crate::utils::output;

/// 执行 check 命令
pub fn execute(args: CheckArgs) -> Result<()> {
    let params = incar::parse_incar_file(&args.incar)?;
    let structure = poscar::parse_poscar_file(&args.structure)?;
    let mesh = resolve_mesh(&args)?;

    output::print_header(&format!("Checking {}", args.incar.display()));
    if mesh.is_none() {
        output::print_warning("No KPOINTS file found; assuming a gamma-only mesh.");
    }

    let (corrected, changes) = copilot::validate(&params, &structure, mesh.as_ref());

    if changes.is_empty() {
        output::print_success("No corrections needed.");
        return Ok(());
    }

    output::print_warning(&format!("{} correction(s) suggested:", changes.len()));
    super::print_changes_table(&changes);

    if args.fix {
        incar::write_incar_file(&args.incar, &corrected)?;
        output::print_done(&format!("{} rewritten in place.", args.incar.display()));
    } else {
        output::print_info("Run again with --fix to apply them.");
    }

    Ok(())
}

fn resolve_mesh(args: &CheckArgs) -> Result<Option<KpointMesh>> {
    if let Some(path) = &args.kpoints {
        return kpoints::parse_kpoints_file(path).map(Some);
    }

    let sibling = match args.incar.parent() {
        Some(dir) => dir.join("KPOINTS"),
        None => return Ok(None),
    };
    if sibling.exists() {
        kpoints::parse_kpoints_file(&sibling).map(Some)
    } else {
        Ok(None)
    }
}
