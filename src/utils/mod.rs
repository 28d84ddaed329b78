//! # 工具函数模块
//!
//! ## 子模块
//! - `output`: 终端输出样式

pub mod output;
