//! # gulp 命令：装配 GULP 输入片段
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `calculators/gulp.rs`, `parsers/poscar.rs`, `utils/output.rs`

use crate::calculators::gulp::{self, GulpOptions};
use crate::cli::gulp::GulpArgs;
use crate::error::Result;
use crate::parsers::poscar;
use crate::utils::output;
use std::collections::BTreeMap;

/// 执行 gulp 命令
pub fn execute(args: GulpArgs) -> Result<()> {
    let structure = poscar::parse_poscar_file(&args.structure)?;

    let mut keyword_swaps = BTreeMap::new();
    for keyword in &args.keywords {
        keyword_swaps.insert(keyword.clone(), true);
    }
    for keyword in &args.no_keywords {
        keyword_swaps.insert(keyword.clone(), false);
    }

    let mut option_swaps = BTreeMap::new();
    for option in &args.options {
        option_swaps.insert(option.clone(), true);
    }
    for option in &args.no_options {
        option_swaps.insert(option.clone(), false);
    }

    let options = GulpOptions {
        gfnff: args.gfnff,
        library: args.library.clone(),
        keyword_swaps,
        option_swaps,
    };
    let calc = gulp::build(&structure, &options);

    output::print_header(&format!("GULP input for {}", structure.formula()));
    println!("{}", calc.keyword_line());
    println!();
    print!("{}", calc.option_lines());

    Ok(())
}
