//! # 数据模型模块
//!
//! 定义跨模块共享的核心数据类型。
//!
//! ## 子模块
//! - `structure`: 原子结构表示（晶格、原子、周期性）
//! - `parameters`: 计算参数集（flag -> 值）
//! - `elements`: 元素周期表静态数据
//!
//! ## 依赖关系
//! - 被 `parsers/`, `defaults/`, `copilot/`, `calculators/` 使用

pub mod elements;
pub mod parameters;
pub mod structure;

pub use elements::Block;
pub use parameters::{ParamValue, ParameterSet};
pub use structure::{Atom, Crystal, Lattice};
