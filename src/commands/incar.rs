//! # incar 命令：装配 VASP 输入
//!
//! 读入结构，按预设 + 覆盖装配计算器，打印 co-pilot 修正表与
//! INCAR/KPOINTS 预览；`--output` 时落盘。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `calculators/vasp.rs`, `parsers/`, `settings.rs`, `utils/output.rs`

use crate::calculators::vasp::{self, VaspOptions};
use crate::cli::incar::IncarArgs;
use crate::error::{Result, VaspilotError};
use crate::models::ParameterSet;
use crate::parsers::incar as incar_format;
use crate::parsers::poscar;
use crate::settings::Settings;
use crate::utils::output;
use std::fs;

/// 执行 incar 命令
pub fn execute(args: IncarArgs) -> Result<()> {
    let settings = Settings::load()?;
    let overrides = parse_set_overrides(&args.set)?;

    let mut structure = poscar::parse_poscar_file(&args.structure)?;
    if args.cluster {
        structure = structure.as_cluster();
    }

    let options = VaspOptions {
        preset: args.preset.clone(),
        copilot: args.no_copilot.then_some(false),
        custodian: args.no_custodian.then_some(false),
    };
    let calc = vasp::build(structure, &settings, &options, &overrides)?;

    output::print_header(&format!("VASP input for {}", calc.structure.formula()));

    for warning in &calc.warnings {
        output::print_warning(warning);
    }

    if !calc.changes.is_empty() && settings.verbose {
        output::print_info(&format!(
            "Co-pilot made {} correction(s):",
            calc.changes.len()
        ));
        super::print_changes_table(&calc.changes);
        println!();
    }

    println!("{}", calc.incar());
    if let Some(kpoints) = calc.kpoints_file() {
        output::print_info("KPOINTS:");
        println!("{}", kpoints);
    }
    output::print_info(&format!("Launch command: {}", calc.command));

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir).map_err(|e| VaspilotError::FileWriteError {
            path: dir.display().to_string(),
            source: e,
        })?;

        incar_format::write_incar_file(&dir.join("INCAR"), &calc.parameters)?;
        if let Some(mesh) = &calc.kpoints {
            if !mesh.line_mode {
                crate::parsers::kpoints::write_kpoints_file(&dir.join("KPOINTS"), mesh)?;
            }
        }
        output::print_done(&format!("Input files written to {}", dir.display()));
    }

    Ok(())
}

/// 解析重复的 `--set FLAG=VALUE` 覆盖
fn parse_set_overrides(pairs: &[String]) -> Result<ParameterSet> {
    let mut overrides = ParameterSet::new();

    for pair in pairs {
        let (flag, value) = pair.split_once('=').ok_or_else(|| {
            VaspilotError::InvalidArgument(format!(
                "override '{}' is not of the form FLAG=VALUE",
                pair
            ))
        })?;
        let flag = flag.trim();
        if flag.is_empty() {
            return Err(VaspilotError::InvalidArgument(format!(
                "override '{}' has an empty flag name",
                pair
            )));
        }
        overrides.set(flag, incar_format::parse_value_token(value));
    }

    Ok(overrides)
}
