//! # presets 命令：列出/展示内置预设
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `defaults/`, `parsers/incar.rs`, `utils/output.rs`

use crate::cli::presets::PresetsArgs;
use crate::defaults;
use crate::error::Result;
use crate::parsers::incar;
use crate::utils::output;

/// 执行 presets 命令
pub fn execute(args: PresetsArgs) -> Result<()> {
    let name = match &args.name {
        Some(name) => name,
        None => {
            output::print_header("Embedded presets");
            for name in defaults::embedded_names() {
                println!("  {}", name);
            }
            return Ok(());
        }
    };

    let preset = defaults::load_preset(name)?;
    output::print_header(&format!("Preset {} (fully merged)", preset.name));

    println!("{}", incar::to_incar_string(&preset.parameters));

    if !preset.elemental_magmoms.is_empty() {
        output::print_info("Initial magnetic moments:");
        for (element, magmom) in &preset.elemental_magmoms {
            println!("  {:4} {}", element, magmom);
        }
    }
    if !preset.setups.is_empty() {
        output::print_info("Pseudopotential setups:");
        for (element, setup) in &preset.setups {
            println!("  {:4} {}", element, setup);
        }
    }
    if let Some(auto) = &preset.auto_kpts {
        if let Some(kppa) = auto.grid_density {
            output::print_info(&format!("Automatic k-mesh: {} k-points per atom", kppa));
        }
        if let Some(density) = auto.length_density {
            output::print_info(&format!(
                "Automatic k-mesh: length density [{}, {}, {}]",
                density[0], density[1], density[2]
            ));
        }
        if let Some(line) = auto.line_density {
            output::print_info(&format!("Band path line density: {}", line));
        }
    }
    if preset.auto_dipole {
        output::print_info("Dipole correction enabled (auto_dipole)");
    }

    Ok(())
}
