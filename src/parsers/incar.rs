//! # VASP INCAR 格式解析器
//!
//! INCAR 文本与 `ParameterSet` 之间的互转。支持 `#` / `!` 注释、
//! 分号分隔的多赋值行、布尔记号 `.TRUE.` / `.FALSE.` 以及数值列表。
//!
//! ## 依赖关系
//! - 被 `commands/check.rs`, `commands/incar.rs` 使用
//! - 使用 `models/parameters.rs`

use crate::error::{Result, VaspilotError};
use crate::models::{ParamValue, ParameterSet};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

fn assignment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+?)\s*$").unwrap())
}

/// 将单个 INCAR 值记号解析为 `ParamValue`
///
/// 解析顺序：布尔 -> 整数 -> 浮点 -> 浮点列表 -> 字符串。
pub fn parse_value_token(token: &str) -> ParamValue {
    let trimmed = token.trim();

    match trimmed.to_lowercase().as_str() {
        ".true." | "true" | "t" => return ParamValue::Bool(true),
        ".false." | "false" | "f" => return ParamValue::Bool(false),
        _ => {}
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return ParamValue::Int(i);
    }
    if let Ok(x) = trimmed.parse::<f64>() {
        return ParamValue::Float(x);
    }

    // 多个数值记号 -> 浮点列表（如 DIPOL = 0.5 0.5 0.5）
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() > 1 {
        let floats: Vec<f64> = parts.iter().filter_map(|p| p.parse().ok()).collect();
        if floats.len() == parts.len() {
            return ParamValue::FloatList(floats);
        }
    }

    ParamValue::Str(trimmed.to_string())
}

/// 解析 INCAR 文件
pub fn parse_incar_file(path: &Path) -> Result<ParameterSet> {
    let content = fs::read_to_string(path).map_err(|e| VaspilotError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_incar_content(&content)
}

/// 从字符串内容解析 INCAR
pub fn parse_incar_content(content: &str) -> Result<ParameterSet> {
    let re = assignment_re();
    let mut params = ParameterSet::new();

    for line in content.lines() {
        // 去掉注释
        let code = match line.find(['#', '!']) {
            Some(pos) => &line[..pos],
            None => line,
        };

        for stmt in code.split(';') {
            if stmt.trim().is_empty() {
                continue;
            }
            if let Some(caps) = re.captures(stmt) {
                let key = &caps[1];
                let value = parse_value_token(&caps[2]);
                params.set(key, value);
            }
        }
    }

    Ok(params)
}

/// 将参数集写出为 INCAR 文本（键名大写，按字母序）
pub fn to_incar_string(params: &ParameterSet) -> String {
    let mut result = String::new();
    for (key, value) in params.iter() {
        result.push_str(&format!("{} = {}\n", key.to_uppercase(), value));
    }
    result
}

/// 写出 INCAR 文件
pub fn write_incar_file(path: &Path, params: &ParameterSet) -> Result<()> {
    fs::write(path, to_incar_string(params)).map_err(|e| VaspilotError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_incar() {
        let content = r#"
# Static run
ENCUT = 520
ISMEAR = -5     ! tetrahedron
SIGMA = 0.05
LASPH = .TRUE.
ALGO = All
"#;
        let params = parse_incar_content(content).unwrap();

        assert_eq!(params.get_int("encut"), Some(520));
        assert_eq!(params.get_int("ismear"), Some(-5));
        assert_eq!(params.get_float("sigma"), Some(0.05));
        assert_eq!(params.get_bool("lasph"), Some(true));
        assert_eq!(params.get_str("algo"), Some("All"));
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn test_parse_semicolon_separated() {
        let params = parse_incar_content("ISMEAR = 1; SIGMA = 0.1\n").unwrap();
        assert_eq!(params.get_int("ismear"), Some(1));
        assert_eq!(params.get_float("sigma"), Some(0.1));
    }

    #[test]
    fn test_parse_float_list() {
        let params = parse_incar_content("DIPOL = 0.5 0.5 0.25\n").unwrap();
        assert_eq!(
            params.get("dipol"),
            Some(&ParamValue::FloatList(vec![0.5, 0.5, 0.25]))
        );
    }

    #[test]
    fn test_comment_only_lines_ignored() {
        let params = parse_incar_content("# ENCUT = 520\n! ISMEAR = 0\n").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_to_incar_string_sorted_upper() {
        let mut params = ParameterSet::new();
        params.set("sigma", 0.05);
        params.set("encut", 520i64);
        params.set("lasph", true);

        let text = to_incar_string(&params);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ENCUT = 520");
        assert_eq!(lines[1], "LASPH = .TRUE.");
        assert_eq!(lines[2], "SIGMA = 0.05");
    }

    #[test]
    fn test_reparse_written_incar() {
        let mut params = ParameterSet::new();
        params.set("ismear", -5i64);
        params.set("lreal", "Auto");

        let reparsed = parse_incar_content(&to_incar_string(&params)).unwrap();
        assert_eq!(reparsed, params);
    }
}
