//! # VASP KPOINTS 格式解析器
//!
//! 只处理本工具涉及的两种形式：自动均匀网格（Gamma / Monkhorst-Pack）
//! 与能带线模式的头部识别。线模式文件的路径坐标不在此解析，
//! 仅用于驱动展宽相关的修正。
//!
//! ## 依赖关系
//! - 被 `commands/check.rs`, `calculators/vasp.rs` 使用
//! - 使用 `copilot/mod.rs` 的 `KpointMesh`

use crate::copilot::KpointMesh;
use crate::error::{Result, VaspilotError};
use std::fs;
use std::path::Path;

fn parse_error(path: &str, reason: impl Into<String>) -> VaspilotError {
    VaspilotError::ParseError {
        format: "KPOINTS".to_string(),
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// 解析 KPOINTS 文件
pub fn parse_kpoints_file(path: &Path) -> Result<KpointMesh> {
    let content = fs::read_to_string(path).map_err(|e| VaspilotError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_kpoints_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 KPOINTS（`path` 仅用于报错）
pub fn parse_kpoints_content(content: &str, path: &str) -> Result<KpointMesh> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 3 {
        return Err(parse_error(path, "file too short"));
    }

    // 第二行：0 表示自动网格，非零为显式 k 点数（线模式等）
    let count: i64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error(path, "invalid k-point count on line 2"))?;

    let scheme = lines[2].trim();
    let first = scheme
        .chars()
        .next()
        .ok_or_else(|| parse_error(path, "missing generation scheme on line 3"))?
        .to_ascii_lowercase();

    if first == 'l' {
        return Ok(KpointMesh {
            mesh: [1, 1, 1],
            gamma: true,
            line_mode: true,
        });
    }

    if count != 0 {
        return Err(parse_error(
            path,
            "only automatic meshes and line mode are supported",
        ));
    }

    let gamma = match first {
        'g' => true,
        'm' => false,
        _ => {
            return Err(parse_error(
                path,
                format!("unknown generation scheme '{}'", scheme),
            ))
        }
    };

    let mesh_line = lines
        .get(3)
        .ok_or_else(|| parse_error(path, "missing mesh line"))?;
    let mesh: Vec<u32> = mesh_line
        .split_whitespace()
        .take(3)
        .filter_map(|t| t.parse().ok())
        .collect();
    if mesh.len() != 3 || mesh.iter().any(|&n| n == 0) {
        return Err(parse_error(path, "invalid mesh dimensions on line 4"));
    }

    Ok(KpointMesh {
        mesh: [mesh[0], mesh[1], mesh[2]],
        gamma,
        line_mode: false,
    })
}

/// 写出自动网格形式的 KPOINTS 文本
pub fn to_kpoints_string(mesh: &KpointMesh) -> String {
    let scheme = if mesh.gamma { "Gamma" } else { "Monkhorst-Pack" };
    format!(
        "Automatic mesh\n0\n{}\n{} {} {}\n0 0 0\n",
        scheme, mesh.mesh[0], mesh.mesh[1], mesh.mesh[2]
    )
}

/// 写出 KPOINTS 文件
pub fn write_kpoints_file(path: &Path, mesh: &KpointMesh) -> Result<()> {
    fs::write(path, to_kpoints_string(mesh)).map_err(|e| VaspilotError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gamma_mesh() {
        let content = "Automatic mesh\n0\nGamma\n4 4 4\n0 0 0\n";
        let mesh = parse_kpoints_content(content, "KPOINTS").unwrap();

        assert_eq!(mesh.mesh, [4, 4, 4]);
        assert!(mesh.gamma);
        assert!(!mesh.line_mode);
    }

    #[test]
    fn test_parse_monkhorst_mesh() {
        let content = "mesh\n0\nMonkhorst-Pack\n6 6 2\n";
        let mesh = parse_kpoints_content(content, "KPOINTS").unwrap();

        assert_eq!(mesh.mesh, [6, 6, 2]);
        assert!(!mesh.gamma);
    }

    #[test]
    fn test_parse_line_mode_header() {
        let content = "band path\n20\nLine-mode\nReciprocal\n0.0 0.0 0.0 ! G\n";
        let mesh = parse_kpoints_content(content, "KPOINTS").unwrap();

        assert!(mesh.line_mode);
        assert_eq!(mesh.nkpts(), 1);
    }

    #[test]
    fn test_reject_explicit_kpoint_list() {
        let content = "explicit\n4\nReciprocal\n0.0 0.0 0.0 1.0\n";
        assert!(parse_kpoints_content(content, "KPOINTS").is_err());
    }

    #[test]
    fn test_reparse_written_mesh() {
        let mesh = KpointMesh {
            mesh: [3, 3, 1],
            gamma: true,
            line_mode: false,
        };
        let reparsed = parse_kpoints_content(&to_kpoints_string(&mesh), "KPOINTS").unwrap();
        assert_eq!(reparsed, mesh);
    }
}
