//! # gulp 子命令参数
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs`, `commands/gulp.rs` 使用

use clap::Args;
use std::path::PathBuf;

/// gulp 命令参数
#[derive(Args)]
pub struct GulpArgs {
    /// Structure file (POSCAR/CONTCAR)
    pub structure: PathBuf,

    /// Use the GFN-FF force field
    #[arg(long)]
    pub gfnff: bool,

    /// Force-field library file, written as a `library` option line
    #[arg(short, long)]
    pub library: Option<String>,

    /// Add a keyword (repeatable)
    #[arg(short = 'k', long = "keyword", value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// Drop a keyword, including defaults (repeatable)
    #[arg(long = "no-keyword", value_name = "KEYWORD")]
    pub no_keywords: Vec<String>,

    /// Add an option line (repeatable)
    #[arg(short = 'O', long = "option", value_name = "LINE")]
    pub options: Vec<String>,

    /// Drop an option line, including defaults (repeatable)
    #[arg(long = "no-option", value_name = "LINE")]
    pub no_options: Vec<String>,
}
