//! # presets 子命令参数
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs`, `commands/presets.rs` 使用

use clap::Args;

/// presets 命令参数
#[derive(Args)]
pub struct PresetsArgs {
    /// Show this preset fully merged (inheritance resolved); omit to list all
    pub name: Option<String>,
}
