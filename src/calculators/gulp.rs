//! # GULP 计算器装配
//!
//! GULP 的输入由关键词行与选项行组成。此处只负责把默认关键词与
//! 用户 swap 合并成最终行；输入文件写出与运行交由外部工具。
//!
//! ## 依赖关系
//! - 被 `commands/gulp.rs` 使用
//! - 使用 `models/structure.rs`

use crate::models::Crystal;
use std::collections::BTreeMap;

/// GULP 装配选项
///
/// swap 值为 true 时加入，false 时删除（可以删掉默认项）。
#[derive(Debug, Clone, Default)]
pub struct GulpOptions {
    /// 使用 GFN-FF 力场
    pub gfnff: bool,

    /// 力场库文件名（写为 `library` 选项行）
    pub library: Option<String>,

    pub keyword_swaps: BTreeMap<String, bool>,
    pub option_swaps: BTreeMap<String, bool>,
}

/// 装配完成的 GULP 输入片段
#[derive(Debug, Clone, PartialEq)]
pub struct GulpCalculator {
    /// 关键词（按字母序）
    pub keywords: Vec<String>,

    /// 选项行（按字母序）
    pub options: Vec<String>,
}

impl GulpCalculator {
    /// 渲染关键词行
    pub fn keyword_line(&self) -> String {
        self.keywords.join(" ")
    }

    /// 渲染选项行
    pub fn option_lines(&self) -> String {
        let mut out = String::new();
        for option in &self.options {
            out.push_str(option);
            out.push('\n');
        }
        out
    }
}

/// 装配 GULP 关键词与选项
pub fn build(structure: &Crystal, options: &GulpOptions) -> GulpCalculator {
    let mut keywords: BTreeMap<String, bool> = BTreeMap::new();
    if options.gfnff {
        keywords.insert("gfnff".to_string(), true);
        if structure.is_periodic() {
            // 周期性 GFN-FF 需要 Wolf 求和处理静电
            keywords.insert("gwolf".to_string(), true);
        }
    }
    for (keyword, keep) in &options.keyword_swaps {
        keywords.insert(keyword.to_lowercase(), *keep);
    }

    let mut option_lines: BTreeMap<String, bool> = BTreeMap::new();
    option_lines.insert("dump every gulp.res".to_string(), true);
    if let Some(library) = &options.library {
        option_lines.insert(format!("library {}", library), true);
    }
    for (option, keep) in &options.option_swaps {
        option_lines.insert(option.clone(), *keep);
    }

    GulpCalculator {
        keywords: keywords
            .into_iter()
            .filter(|(_, keep)| *keep)
            .map(|(k, _)| k)
            .collect(),
        options: option_lines
            .into_iter()
            .filter(|(_, keep)| *keep)
            .map(|(k, _)| k)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn water() -> Crystal {
        let lattice =
            Lattice::from_vectors([[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
        Crystal::new(
            "H2O",
            lattice,
            vec![
                Atom::new("O", [0.5, 0.5, 0.5]),
                Atom::new("H", [0.55, 0.5, 0.5]),
                Atom::new("H", [0.5, 0.55, 0.5]),
            ],
        )
        .as_cluster()
    }

    #[test]
    fn test_gfnff_molecule_skips_gwolf() {
        let options = GulpOptions {
            gfnff: true,
            ..Default::default()
        };
        let calc = build(&water(), &options);

        assert_eq!(calc.keyword_line(), "gfnff");
        assert!(calc.option_lines().contains("dump every gulp.res"));
    }

    #[test]
    fn test_gfnff_periodic_adds_gwolf() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let bulk = Crystal::new("C", lattice, vec![Atom::new("C", [0.0; 3])]);

        let options = GulpOptions {
            gfnff: true,
            ..Default::default()
        };
        let calc = build(&bulk, &options);

        assert_eq!(calc.keyword_line(), "gfnff gwolf");
    }

    #[test]
    fn test_keyword_swaps_add_and_remove() {
        let mut keyword_swaps = BTreeMap::new();
        keyword_swaps.insert("opti".to_string(), true);
        keyword_swaps.insert("gwolf".to_string(), false);

        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let bulk = Crystal::new("C", lattice, vec![Atom::new("C", [0.0; 3])]);

        let options = GulpOptions {
            gfnff: true,
            keyword_swaps,
            ..Default::default()
        };
        let calc = build(&bulk, &options);

        assert_eq!(calc.keyword_line(), "gfnff opti");
    }

    #[test]
    fn test_option_swaps_drop_default_dump() {
        let mut option_swaps = BTreeMap::new();
        option_swaps.insert("dump every gulp.res".to_string(), false);

        let options = GulpOptions {
            library: Some("reaxff.lib".to_string()),
            option_swaps,
            ..Default::default()
        };
        let calc = build(&water(), &options);

        assert_eq!(calc.options, vec!["library reaxff.lib".to_string()]);
    }
}
