//! # 外部纠错运行器（custodian）接驳层
//!
//! 本层只做三件事：解析设置文件路径、校验设置内容、把控制权交给
//! 外部纠错运行器（或直接执行 VASP 命令）。不解释任何 DFT 错误，
//! 子进程的退出码原样向上传递。
//!
//! ## 依赖关系
//! - 被 `src/bin/run_vasp_custodian.rs` 使用
//! - 使用 `error.rs`

use crate::error::{Result, VaspilotError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

/// 设置文件覆盖路径的环境变量
pub const SETTINGS_ENV_VAR: &str = "VASP_CUSTODIAN_SETTINGS";

/// 默认设置文件名（与可执行文件同目录）
pub const DEFAULT_SETTINGS_FILE: &str = "vasp_custodian_settings.yaml";

/// 纠错运行器支持的错误处理器名称
pub const KNOWN_HANDLERS: &[&str] = &[
    "VaspErrorHandler",
    "FrozenJobErrorHandler",
    "IncorrectSmearingHandler",
    "LargeSigmaHandler",
    "MeshSymmetryErrorHandler",
    "NonConvergingErrorHandler",
    "PositiveEnergyErrorHandler",
    "PotimErrorHandler",
    "ScanMetalHandler",
    "StdErrHandler",
    "UnconvergedErrorHandler",
    "WalltimeHandler",
];

/// 纠错运行器支持的结果校验器名称
pub const KNOWN_VALIDATORS: &[&str] = &["VaspFilesValidator", "VasprunXMLValidator"];

/// 纠错运行器设置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodianSettings {
    /// 关闭时 shim 直接跑 `vasp_cmd`
    pub custodian_enabled: bool,

    /// 外部纠错运行器命令；设置文件路径作为第一个参数传入
    pub custodian_cmd: String,

    pub vasp_cmd: String,
    pub vasp_gamma_cmd: String,

    pub handlers: Vec<String>,
    pub validators: Vec<String>,

    /// 放弃前允许的纠错次数
    pub max_errors: u32,

    /// 墙钟时间限制（秒）；None 表示不限制
    pub wall_time: Option<u64>,

    pub scratch_dir: Option<String>,

    /// 启用 VTST 相关的 POTIM/IOPT 修正
    pub vtst_swaps: bool,
}

impl Default for CustodianSettings {
    fn default() -> Self {
        CustodianSettings {
            custodian_enabled: true,
            custodian_cmd: "run_custodian".to_string(),
            vasp_cmd: "vasp_std".to_string(),
            vasp_gamma_cmd: "vasp_gam".to_string(),
            handlers: vec![
                "VaspErrorHandler".to_string(),
                "FrozenJobErrorHandler".to_string(),
                "IncorrectSmearingHandler".to_string(),
                "LargeSigmaHandler".to_string(),
                "MeshSymmetryErrorHandler".to_string(),
                "NonConvergingErrorHandler".to_string(),
                "PositiveEnergyErrorHandler".to_string(),
                "PotimErrorHandler".to_string(),
                "StdErrHandler".to_string(),
                "UnconvergedErrorHandler".to_string(),
            ],
            validators: KNOWN_VALIDATORS.iter().map(|s| s.to_string()).collect(),
            max_errors: 5,
            wall_time: None,
            scratch_dir: None,
            vtst_swaps: false,
        }
    }
}

impl CustodianSettings {
    /// 从 YAML 文件加载并校验
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| VaspilotError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
        let settings = Self::from_yaml_str(&content, &path.display().to_string())?;
        Ok(settings)
    }

    /// 从 YAML 文本加载并校验（`origin` 仅用于报错）
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self> {
        let settings: CustodianSettings =
            serde_yaml::from_str(content).map_err(|e| VaspilotError::YamlParseError {
                path: origin.to_string(),
                source: e,
            })?;
        settings.check_names(origin)?;
        Ok(settings)
    }

    /// 处理器/校验器名称必须在已知集合内
    fn check_names(&self, origin: &str) -> Result<()> {
        for handler in &self.handlers {
            if !KNOWN_HANDLERS.contains(&handler.as_str()) {
                return Err(VaspilotError::ConfigError {
                    path: origin.to_string(),
                    reason: format!(
                        "unknown error handler '{}' (known: {})",
                        handler,
                        KNOWN_HANDLERS.join(", ")
                    ),
                });
            }
        }
        for validator in &self.validators {
            if !KNOWN_VALIDATORS.contains(&validator.as_str()) {
                return Err(VaspilotError::ConfigError {
                    path: origin.to_string(),
                    reason: format!(
                        "unknown validator '{}' (known: {})",
                        validator,
                        KNOWN_VALIDATORS.join(", ")
                    ),
                });
            }
        }
        Ok(())
    }
}

/// 解析设置文件路径
///
/// 优先级：`VASP_CUSTODIAN_SETTINGS` 环境变量 > 可执行文件同目录的
/// 默认文件。两者都不可用时为致命配置错误。
pub fn resolve_settings_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(SETTINGS_ENV_VAR) {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(VaspilotError::ConfigError {
                path: path.display().to_string(),
                reason: format!("{} points to a missing file", SETTINGS_ENV_VAR),
            });
        }
        return Ok(path);
    }

    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_SETTINGS_FILE)));

    match sibling {
        Some(path) if path.exists() => Ok(path),
        Some(path) => Err(VaspilotError::ConfigError {
            path: path.display().to_string(),
            reason: format!(
                "no custodian settings file found; set {} or place one next to the executable",
                SETTINGS_ENV_VAR
            ),
        }),
        None => Err(VaspilotError::ConfigError {
            path: DEFAULT_SETTINGS_FILE.to_string(),
            reason: "cannot determine the executable directory".to_string(),
        }),
    }
}

fn env_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").unwrap())
}

/// 展开命令模板中的 `$VAR` / `${VAR}` 引用；缺失的变量是致命错误
pub fn expand_env_vars(command: &str) -> Result<String> {
    let re = env_ref_re();
    let mut expanded = String::with_capacity(command.len());
    let mut last = 0;

    for caps in re.captures_iter(command) {
        let whole = caps.get(0).ok_or_else(|| {
            VaspilotError::Other("environment reference match without capture".to_string())
        })?;
        let name = &caps[1];
        let value = std::env::var(name).map_err(|_| VaspilotError::MissingEnvVar {
            name: name.to_string(),
            context: format!("referenced in command '{}'", command),
        })?;

        expanded.push_str(&command[last..whole.start()]);
        expanded.push_str(&value);
        last = whole.end();
    }
    expanded.push_str(&command[last..]);

    Ok(expanded)
}

/// 执行纠错运行器（或直接的 VASP 命令），返回子进程退出码
pub fn run(settings: &CustodianSettings, settings_path: &Path) -> Result<i32> {
    let command = if settings.custodian_enabled {
        format!(
            "{} {}",
            expand_env_vars(&settings.custodian_cmd)?,
            settings_path.display()
        )
    } else {
        expand_env_vars(&settings.vasp_cmd)?
    };

    let status = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .status()
        .map_err(|e| VaspilotError::CommandError {
            command: command.clone(),
            source: e,
        })?;

    // 信号终止没有退出码，统一按失败处理
    Ok(status.code().unwrap_or(1))
}
