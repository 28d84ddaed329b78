//! # 格式解析器模块
//!
//! VASP 输入文件的读写。
//!
//! ## 子模块
//! - `poscar`: POSCAR/CONTCAR 结构文件
//! - `incar`: INCAR 参数文件
//! - `kpoints`: KPOINTS 自动网格文件
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `copilot/`

pub mod incar;
pub mod kpoints;
pub mod poscar;
