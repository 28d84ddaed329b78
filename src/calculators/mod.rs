//! # 计算器工厂模块
//!
//! 把"结构 + 预设 + 用户覆盖"装配为一份可直接落盘的计算输入。
//!
//! ## 子模块
//! - `vasp`: VASP 计算器（INCAR/KPOINTS + 启动命令）
//! - `gulp`: GULP 关键词/选项行装配
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `defaults/`, `copilot/`, `models/`, `settings.rs`

pub mod gulp;
pub mod vasp;

pub use gulp::{GulpCalculator, GulpOptions};
pub use vasp::{VaspCalculator, VaspOptions};
