//! # Vaspilot - DFT 计算输入装配库
//!
//! 把"结构 + 预设 + 用户覆盖"装配为可直接使用的 DFT 输入：
//! YAML 预设继承、INCAR co-pilot flag 校验、自动 k 点网格、
//! 初始磁矩填充，以及外部纠错运行器（custodian）接驳。
//!
//! ## 模块结构
//! ```text
//! lib.rs
//!   ├── models/      (参数、结构、元素数据模型)
//!   ├── defaults/    (内置预设与继承加载器)
//!   ├── copilot/     (INCAR flag 校验器)
//!   ├── calculators/ (VASP/GULP 计算器工厂)
//!   ├── custodian.rs (外部纠错运行器接驳)
//!   ├── parsers/     (POSCAR/INCAR/KPOINTS 读写)
//!   ├── settings.rs  (全局设置)
//!   ├── cli/ + commands/ (命令行界面)
//!   ├── utils/       (输出工具)
//!   └── error.rs     (错误处理)
//! ```

pub mod calculators;
pub mod cli;
pub mod commands;
pub mod copilot;
pub mod custodian;
pub mod defaults;
pub mod error;
pub mod models;
pub mod parsers;
pub mod settings;
pub mod utils;

pub use copilot::{validate, Change, KpointMesh};
pub use error::{Result, VaspilotError};
pub use models::{Crystal, ParamValue, ParameterSet};
pub use settings::Settings;
