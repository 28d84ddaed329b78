//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `incar`: 由结构 + 预设装配 VASP 输入
//! - `check`: 检查既有 INCAR 的 flag 约束
//! - `gulp`: 装配 GULP 关键词/选项行
//! - `presets`: 列出或展示内置预设
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: incar, check, gulp, presets

pub mod check;
pub mod gulp;
pub mod incar;
pub mod presets;

use clap::{Parser, Subcommand};

/// Vaspilot - DFT 计算输入装配工具
#[derive(Parser)]
#[command(name = "vaspilot")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "A DFT calculation setup toolkit with INCAR co-pilot", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Assemble VASP input (INCAR/KPOINTS) from a structure and a preset
    Incar(incar::IncarArgs),

    /// Check an existing INCAR against the co-pilot rules
    Check(check::CheckArgs),

    /// Assemble the GULP keyword and option lines
    Gulp(gulp::GulpArgs),

    /// List embedded presets or show one fully merged
    Presets(presets::PresetsArgs),
}
