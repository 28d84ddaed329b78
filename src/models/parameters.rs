//! # 计算参数数据模型
//!
//! DFT 输入参数（flag -> 值）的统一表示。参数集在计算器构建完成后不再修改，
//! 序列化顺序与 INCAR 书写顺序一致（按键排序）。
//!
//! ## 依赖关系
//! - 被 `defaults/`, `copilot/`, `calculators/`, `parsers/incar.rs` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 单个输入参数的值
///
/// 布尔值按 VASP 约定显示为 `.TRUE.` / `.FALSE.`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// 布尔 flag（如 LASPH）
    Bool(bool),
    /// 整数 flag（如 ISMEAR, NSW）
    Int(i64),
    /// 浮点 flag（如 ENCUT, SIGMA）
    Float(f64),
    /// 字符串 flag（如 ALGO, METAGGA）
    Str(String),
    /// 浮点列表（如 DIPOL, MAGMOM）
    FloatList(Vec<f64>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// 整数也按浮点返回，方便数值比较
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 宽松的"真值"判断
    ///
    /// 规则表中的若干谓词只关心 flag 是否被有效开启（如 LREAL = Auto）。
    pub fn is_truthy(&self) -> bool {
        match self {
            ParamValue::Bool(b) => *b,
            ParamValue::Int(i) => *i != 0,
            ParamValue::Float(f) => *f != 0.0,
            ParamValue::Str(s) => {
                !matches!(s.to_lowercase().as_str(), "" | "f" | "false" | ".false.")
            }
            ParamValue::FloatList(v) => !v.is_empty(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(true) => write!(f, ".TRUE."),
            ParamValue::Bool(false) => write!(f, ".FALSE."),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(s) => write!(f, "{}", s),
            ParamValue::FloatList(v) => {
                let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::FloatList(v)
    }
}

/// 参数集：flag 名（统一小写）到值的有序映射
///
/// 所有访问接口均大小写不敏感。`merge` 实现默认值 → 用户覆盖的合并语义，
/// 后者优先。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet {
    map: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        ParameterSet::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.map.insert(key.to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.map.get(&key.to_lowercase())
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.map.remove(&key.to_lowercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.map.iter()
    }

    /// 合并两个参数集，`other` 优先（大小写不敏感）
    pub fn merge(&self, other: &ParameterSet) -> ParameterSet {
        let mut merged = self.clone();
        for (k, v) in other.iter() {
            merged.map.insert(k.clone(), v.clone());
        }
        merged
    }

    // ─────────────────────────────────────────────────────────────
    // 类型化读取接口
    // ─────────────────────────────────────────────────────────────

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_int())
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_float())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// flag 存在且为"真值"
    pub fn truthy(&self, key: &str) -> bool {
        self.get(key).map(|v| v.is_truthy()).unwrap_or(false)
    }
}

impl From<BTreeMap<String, ParamValue>> for ParameterSet {
    fn from(map: BTreeMap<String, ParamValue>) -> Self {
        let mut set = ParameterSet::new();
        for (k, v) in map {
            set.map.insert(k.to_lowercase(), v);
        }
        set
    }
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = BTreeMap::<String, ParamValue>::deserialize(deserializer)?;
        Ok(map.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_access() {
        let mut params = ParameterSet::new();
        params.set("ENCUT", 520.0);

        assert_eq!(params.get_float("encut"), Some(520.0));
        assert_eq!(params.get_float("Encut"), Some(520.0));
        assert!(params.contains("ENCUT"));
    }

    #[test]
    fn test_merge_second_wins() {
        let mut defaults = ParameterSet::new();
        defaults.set("encut", 520.0);
        defaults.set("ismear", 0i64);

        let mut overrides = ParameterSet::new();
        overrides.set("ENCUT", 400.0);

        let merged = defaults.merge(&overrides);
        assert_eq!(merged.get_float("encut"), Some(400.0));
        assert_eq!(merged.get_int("ismear"), Some(0));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_truthy_string_values() {
        let mut params = ParameterSet::new();
        params.set("lreal", "Auto");
        params.set("lwave", false);

        assert!(params.truthy("lreal"));
        assert!(!params.truthy("lwave"));
        assert!(!params.truthy("missing"));
    }

    #[test]
    fn test_display_incar_tokens() {
        assert_eq!(ParamValue::Bool(true).to_string(), ".TRUE.");
        assert_eq!(ParamValue::Bool(false).to_string(), ".FALSE.");
        assert_eq!(ParamValue::Int(-5).to_string(), "-5");
        assert_eq!(ParamValue::Str("All".into()).to_string(), "All");
        assert_eq!(
            ParamValue::FloatList(vec![0.5, 0.5, 0.5]).to_string(),
            "0.5 0.5 0.5"
        );
    }

    #[test]
    fn test_yaml_deserialization_types() {
        let yaml = "encut: 520\nsigma: 0.05\nlasph: true\nalgo: All\ndipol: [0.5, 0.5, 0.5]\n";
        let params: ParameterSet = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(params.get("encut"), Some(&ParamValue::Int(520)));
        assert_eq!(params.get("sigma"), Some(&ParamValue::Float(0.05)));
        assert_eq!(params.get("lasph"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("algo"), Some(&ParamValue::Str("All".into())));
        assert_eq!(
            params.get("dipol"),
            Some(&ParamValue::FloatList(vec![0.5, 0.5, 0.5]))
        );
    }
}
