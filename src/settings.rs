//! # 全局设置模块
//!
//! 三层取值：内置默认值 < YAML 设置文件 < `VASPILOT_` 前缀环境变量。
//! 设置文件默认为 `~/.vaspilot.yaml`，可用 `VASPILOT_CONFIG_FILE` 指定。
//! 默认路径下文件不存在时静默使用默认值；显式指定的文件缺失或格式错误
//! 属于致命配置错误。
//!
//! ## 消费（但不拥有）的环境变量
//! - `VASP_PP_PATH`: 赝势库路径（ASE 约定）
//! - `VASP_VDW_KERNEL`: vdW 核函数文件路径
//! - `VASP_CUSTODIAN_SETTINGS`: 外部纠错运行器设置文件覆盖路径
//!
//! ## 依赖关系
//! - 被 `calculators/`, `commands/` 使用
//! - 使用 `error.rs`

use crate::error::{Result, VaspilotError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 设置文件的默认文件名（位于用户主目录）
const DEFAULT_CONFIG_FILE: &str = ".vaspilot.yaml";

/// 全局设置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 计算临时目录；以 `$` 开头时从环境变量展开
    pub scratch_dir: String,

    /// VASP 标准版命令
    pub vasp_cmd: String,

    /// VASP Γ 点版命令
    pub vasp_gamma_cmd: String,

    /// 并行启动前缀（如 `srun -N 2`），可为空
    pub vasp_parallel_cmd: String,

    /// 是否通过外部纠错运行器（custodian shim）启动 VASP
    pub vasp_custodian: bool,

    /// 纠错运行器设置文件路径；None 时由 shim 自行解析
    pub vasp_custodian_settings: Option<PathBuf>,

    /// 是否启用 INCAR co-pilot
    pub incar_copilot: bool,

    /// 预设磁矩表中缺失元素的默认初始磁矩
    pub preset_mag_default: f64,

    /// 初始磁矩绝对值全部低于该阈值时清零（做非自旋极化计算）
    pub mag_cutoff: f64,

    /// 是否打印 co-pilot 修正信息
    pub verbose: bool,

    /// 工作流数据库配置文件路径（由外部工作流引擎消费）
    pub workflow_db_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            scratch_dir: ".".to_string(),
            vasp_cmd: "vasp_std".to_string(),
            vasp_gamma_cmd: "vasp_gam".to_string(),
            vasp_parallel_cmd: String::new(),
            vasp_custodian: true,
            vasp_custodian_settings: None,
            incar_copilot: true,
            preset_mag_default: 1.0,
            mag_cutoff: 0.05,
            verbose: true,
            workflow_db_file: None,
        }
    }
}

impl Settings {
    /// 按默认规则加载设置
    pub fn load() -> Result<Self> {
        match std::env::var("VASPILOT_CONFIG_FILE") {
            Ok(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(VaspilotError::ConfigError {
                        path: path.display().to_string(),
                        reason: "VASPILOT_CONFIG_FILE points to a missing file".to_string(),
                    });
                }
                Self::load_from(&path)
            }
            Err(_) => {
                let default_path = std::env::var("HOME")
                    .map(|home| Path::new(&home).join(DEFAULT_CONFIG_FILE))
                    .ok();
                match default_path {
                    Some(p) if p.exists() => Self::load_from(&p),
                    _ => {
                        let mut settings = Settings::default();
                        settings.apply_env_overrides();
                        settings.expand_scratch_dir()?;
                        Ok(settings)
                    }
                }
            }
        }
    }

    /// 从指定 YAML 文件加载设置
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| VaspilotError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
        let mut settings = Self::from_yaml_str(&content, &path.display().to_string())?;
        settings.apply_env_overrides();
        settings.expand_scratch_dir()?;
        Ok(settings)
    }

    /// 从 YAML 文本解析设置（`path` 仅用于报错）
    pub fn from_yaml_str(content: &str, path: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| VaspilotError::YamlParseError {
            path: path.to_string(),
            source: e,
        })
    }

    /// `VASPILOT_` 前缀环境变量覆盖
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VASPILOT_SCRATCH_DIR") {
            self.scratch_dir = v;
        }
        if let Ok(v) = std::env::var("VASPILOT_VASP_CMD") {
            self.vasp_cmd = v;
        }
        if let Ok(v) = std::env::var("VASPILOT_VASP_GAMMA_CMD") {
            self.vasp_gamma_cmd = v;
        }
        if let Ok(v) = std::env::var("VASPILOT_VASP_PARALLEL_CMD") {
            self.vasp_parallel_cmd = v;
        }
        if let Ok(v) = std::env::var("VASPILOT_VASP_CUSTODIAN") {
            self.vasp_custodian = parse_bool_env(&v).unwrap_or(self.vasp_custodian);
        }
        if let Ok(v) = std::env::var("VASPILOT_INCAR_COPILOT") {
            self.incar_copilot = parse_bool_env(&v).unwrap_or(self.incar_copilot);
        }
        if let Ok(v) = std::env::var("VASPILOT_CUSTODIAN_SETTINGS") {
            self.vasp_custodian_settings = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("VASPILOT_DB_FILE") {
            self.workflow_db_file = Some(PathBuf::from(v));
        }
    }

    /// scratch_dir 支持 `$SCRATCH` 风格的环境变量引用
    fn expand_scratch_dir(&mut self) -> Result<()> {
        if let Some(var) = self.scratch_dir.strip_prefix('$') {
            let var = var.trim_start_matches('{').trim_end_matches('}');
            match std::env::var(var) {
                Ok(v) => self.scratch_dir = v,
                Err(_) => {
                    return Err(VaspilotError::MissingEnvVar {
                        name: var.to_string(),
                        context: "referenced by scratch_dir in settings".to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
