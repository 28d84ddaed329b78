//! # 默认参数表（预设）加载模块
//!
//! 每个预设是一个 YAML 文件：`inputs` 映射存放 INCAR flag，外加四个由
//! 加载器解释的特殊键（`elemental_magmoms`, `setups`, `auto_kpts`,
//! `auto_dipole`）。预设可通过 `parent` 继承另一预设，子级优先，
//! 嵌套表按键深合并。
//!
//! 内置预设通过 `include_str!` 打包进二进制；名称未命中内置表时按
//! 文件路径解析（无扩展名自动补 `.yaml`）。未知预设名属于致命配置错误。
//!
//! ## 依赖关系
//! - 被 `calculators/vasp.rs`, `commands/presets.rs` 使用
//! - 使用 `models/parameters.rs`, `error.rs`

use crate::error::{Result, VaspilotError};
use crate::models::{ParamValue, ParameterSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 内置预设表（名称 -> YAML 内容）
const EMBEDDED_PRESETS: &[(&str, &str)] = &[
    ("BulkSet", include_str!("BulkSet.yaml")),
    ("SlabSet", include_str!("SlabSet.yaml")),
    ("MPScanSet", include_str!("MPScanSet.yaml")),
    ("MoleculeSet", include_str!("MoleculeSet.yaml")),
];

/// 预设继承链的最大深度（防止 parent 成环）
const MAX_PARENT_DEPTH: usize = 8;

/// 内置预设名称列表
pub fn embedded_names() -> Vec<&'static str> {
    EMBEDDED_PRESETS.iter().map(|(name, _)| *name).collect()
}

/// 自动 k 点生成方案
///
/// 与原始 YAML 的单键字典写法保持一致：恰好设置其中一个字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoKpts {
    /// 每原子 k 点密度 (kppa)
    #[serde(default)]
    pub grid_density: Option<f64>,

    /// 沿三个倒易方向的长度密度
    #[serde(default)]
    pub length_density: Option<[f64; 3]>,

    /// 能带线模式的路径密度；网格生成交由外部工具，仅驱动展宽修正
    #[serde(default)]
    pub line_density: Option<f64>,
}

/// 加载完成的预设（已展开继承链）
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    /// 普通 INCAR flag
    pub parameters: ParameterSet,
    /// 元素 -> 初始磁矩
    pub elemental_magmoms: BTreeMap<String, f64>,
    /// 元素 -> 赝势 setup 后缀（如 `_pv`）
    pub setups: BTreeMap<String, String>,
    pub auto_kpts: Option<AutoKpts>,
    pub auto_dipole: bool,
}

/// YAML 文件的原始结构
#[derive(Debug, Deserialize)]
struct RawPreset {
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    inputs: BTreeMap<String, serde_yaml::Value>,
}

/// 继承解析过程中的中间形态（auto_dipole 需区分"未指定"）
#[derive(Debug, Default)]
struct PartialPreset {
    parameters: ParameterSet,
    elemental_magmoms: BTreeMap<String, f64>,
    setups: BTreeMap<String, String>,
    auto_kpts: Option<AutoKpts>,
    auto_dipole: Option<bool>,
}

/// 按名称或路径加载预设
pub fn load_preset(name: &str) -> Result<Preset> {
    let partial = load_partial(name, 0)?;
    Ok(finish(name, partial))
}

/// 从 YAML 文本加载预设（`name` 仅用于报错；不解析 parent 链之外的文件）
pub fn load_preset_from_str(name: &str, content: &str) -> Result<Preset> {
    let partial = parse_and_inherit(name, content, 0)?;
    Ok(finish(name, partial))
}

fn finish(name: &str, partial: PartialPreset) -> Preset {
    let mut setups = partial.setups;
    normalize_setups(&mut setups);

    Preset {
        name: name.to_string(),
        parameters: partial.parameters,
        elemental_magmoms: partial.elemental_magmoms,
        setups,
        auto_kpts: partial.auto_kpts,
        auto_dipole: partial.auto_dipole.unwrap_or(false),
    }
}

fn load_partial(name: &str, depth: usize) -> Result<PartialPreset> {
    if depth > MAX_PARENT_DEPTH {
        return Err(VaspilotError::ConfigError {
            path: name.to_string(),
            reason: "preset parent chain too deep (cycle?)".to_string(),
        });
    }

    let content = resolve_content(name)?;
    parse_and_inherit(name, &content, depth)
}

fn parse_and_inherit(name: &str, content: &str, depth: usize) -> Result<PartialPreset> {
    let raw: RawPreset =
        serde_yaml::from_str(content).map_err(|e| VaspilotError::YamlParseError {
            path: name.to_string(),
            source: e,
        })?;

    let mut merged = match &raw.parent {
        Some(parent) => load_partial(parent, depth + 1)?,
        None => PartialPreset::default(),
    };

    let own = split_inputs(name, raw.inputs)?;

    // 子级优先；嵌套表按键深合并
    merged.parameters = merged.parameters.merge(&own.parameters);
    merged.elemental_magmoms.extend(own.elemental_magmoms);
    merged.setups.extend(own.setups);
    if own.auto_kpts.is_some() {
        merged.auto_kpts = own.auto_kpts;
    }
    if own.auto_dipole.is_some() {
        merged.auto_dipole = own.auto_dipole;
    }

    Ok(merged)
}

/// 拆分 `inputs` 映射：特殊键与普通 flag 分开
fn split_inputs(
    name: &str,
    inputs: BTreeMap<String, serde_yaml::Value>,
) -> Result<PartialPreset> {
    let mut partial = PartialPreset::default();

    for (key, value) in inputs {
        let invalid = |reason: String| VaspilotError::ConfigError {
            path: name.to_string(),
            reason,
        };

        match key.to_lowercase().as_str() {
            "elemental_magmoms" => {
                partial.elemental_magmoms = serde_yaml::from_value(value)
                    .map_err(|e| invalid(format!("invalid elemental_magmoms: {}", e)))?;
            }
            "setups" => {
                partial.setups = serde_yaml::from_value(value)
                    .map_err(|e| invalid(format!("invalid setups: {}", e)))?;
            }
            "auto_kpts" => {
                partial.auto_kpts = Some(
                    serde_yaml::from_value(value)
                        .map_err(|e| invalid(format!("invalid auto_kpts: {}", e)))?,
                );
            }
            "auto_dipole" => {
                partial.auto_dipole = Some(
                    serde_yaml::from_value(value)
                        .map_err(|e| invalid(format!("invalid auto_dipole: {}", e)))?,
                );
            }
            _ => {
                let pv: ParamValue = serde_yaml::from_value(value)
                    .map_err(|e| invalid(format!("invalid value for flag '{}': {}", key, e)))?;
                partial.parameters.set(&key, pv);
            }
        }
    }

    Ok(partial)
}

/// 解析预设来源：内置名 -> 文件路径
fn resolve_content(name: &str) -> Result<String> {
    if let Some((_, content)) = EMBEDDED_PRESETS.iter().find(|(n, _)| *n == name) {
        return Ok((*content).to_string());
    }

    let path = if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{}.yaml", name)
    };

    let path = Path::new(&path);
    if path.exists() {
        std::fs::read_to_string(path).map_err(|e| VaspilotError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })
    } else {
        Err(VaspilotError::UnknownPreset {
            name: name.to_string(),
            known: embedded_names().join(", "),
        })
    }
}

/// `Cu: Cu_pv` 与 `Cu: _pv` 两种写法等价，统一存为后缀
fn normalize_setups(setups: &mut BTreeMap<String, String>) {
    for (element, setup) in setups.iter_mut() {
        if let Some(suffix) = setup.strip_prefix(element.as_str()) {
            if !suffix.is_empty() {
                *setup = suffix.to_string();
            }
        }
    }
}
