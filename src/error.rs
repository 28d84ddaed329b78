//! # 统一错误处理模块
//!
//! 定义 Vaspilot 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// Vaspilot 统一错误类型
#[derive(Error, Debug)]
pub enum VaspilotError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 配置错误（启动即失败，不重试）
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error in {path}: {reason}")]
    ConfigError { path: String, reason: String },

    #[error("Failed to parse YAML file: {path}\nReason: {source}")]
    YamlParseError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unknown preset '{name}'. Available presets: {known}")]
    UnknownPreset { name: String, known: String },

    #[error("Missing environment variable {name} ({context})")]
    MissingEnvVar { name: String, context: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command failed to start: {command}")]
    CommandError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, VaspilotError>;
