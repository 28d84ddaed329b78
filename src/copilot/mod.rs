//! # INCAR co-pilot（flag 校验器）
//!
//! `validate` 是纯函数：对照固定顺序的规则表检查参数集，改写违反
//! VASP 手册约束的 flag，并记录每一次修正。规则按声明顺序求值，
//! 前面的修正对后面的谓词可见；顺序本身是公开契约的一部分
//! （见 `rules::RULES`）。
//!
//! 校验不会失败：每条规则都有确定的修正动作。对已修正的参数集再次
//! 校验不产生任何修正（幂等）。规则表之外的 flag 原样通过。
//!
//! ## 依赖关系
//! - 被 `calculators/vasp.rs`, `commands/check.rs` 使用
//! - 使用 `models/`
//! - 子模块: rules

pub mod rules;

use crate::models::{Block, Crystal, ParameterSet};

/// 单条 co-pilot 修正记录
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// 被修正的主 flag 名（小写）
    pub flag: String,
    /// 人类可读的修正说明
    pub note: String,
}

impl Change {
    pub fn new(flag: &str, note: impl Into<String>) -> Self {
        Change {
            flag: flag.to_lowercase(),
            note: note.into(),
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Copilot: {}", self.note)
    }
}

/// k 点网格信息（来自显式 kpts 或自动生成）
#[derive(Debug, Clone, PartialEq)]
pub struct KpointMesh {
    pub mesh: [u32; 3],
    /// Γ 心网格
    pub gamma: bool,
    /// 能带线模式
    pub line_mode: bool,
}

impl KpointMesh {
    pub fn nkpts(&self) -> u64 {
        self.mesh.iter().map(|&n| n as u64).product()
    }
}

/// 规则求值上下文：从结构与 k 点网格提取的只读元数据
#[derive(Debug)]
pub struct RuleCtx<'a> {
    pub n_atoms: usize,
    pub periodic: bool,
    pub is_metal: bool,
    pub max_block: Option<Block>,
    /// 结构上存在非零初始磁矩
    pub magmom_hint: bool,
    pub kpoints: Option<&'a KpointMesh>,
}

impl<'a> RuleCtx<'a> {
    pub fn from_structure(structure: &Crystal, kpoints: Option<&'a KpointMesh>) -> Self {
        RuleCtx {
            n_atoms: structure.atoms.len(),
            periodic: structure.is_periodic(),
            is_metal: structure.is_likely_metal(),
            max_block: structure.highest_block(),
            magmom_hint: structure.has_nonzero_magmoms(),
            kpoints,
        }
    }

    /// 网格中的 k 点总数；网格未知时按 Γ 点（1 个）处理
    pub fn nkpts(&self) -> u64 {
        self.kpoints.map(|k| k.nkpts()).unwrap_or(1)
    }

    pub fn line_mode(&self) -> bool {
        self.kpoints.map(|k| k.line_mode).unwrap_or(false)
    }
}

/// 校验并修正参数集
///
/// 返回修正后的参数集与修正记录。不做 I/O，不修改输入。
pub fn validate(
    params: &ParameterSet,
    structure: &Crystal,
    kpoints: Option<&KpointMesh>,
) -> (ParameterSet, Vec<Change>) {
    let ctx = RuleCtx::from_structure(structure, kpoints);
    let mut corrected = params.clone();
    let mut changes = Vec::new();

    for rule in rules::RULES {
        (rule.apply)(&mut corrected, &ctx, &mut changes);
    }

    (corrected, changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Crystal, Lattice};

    fn bulk(element: &str) -> Crystal {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        Crystal::new(
            element,
            lattice,
            vec![
                Atom::new(element, [0.0, 0.0, 0.0]),
                Atom::new(element, [0.5, 0.5, 0.5]),
            ],
        )
    }

    fn dense_mesh() -> KpointMesh {
        KpointMesh {
            mesh: [4, 4, 4],
            gamma: true,
            line_mode: false,
        }
    }

    #[test]
    fn test_validate_is_pure() {
        let mut params = ParameterSet::new();
        params.set("metagga", "R2SCAN");
        let before = params.clone();

        let structure = bulk("Cu");
        let _ = validate(&params, &structure, None);

        assert_eq!(params, before);
    }

    #[test]
    fn test_validate_is_idempotent() {
        // 触发多条规则的参数组合
        let mut params = ParameterSet::new();
        params.set("metagga", "R2SCAN");
        params.set("encut", 400i64);
        params.set("nsw", 99i64);
        params.set("isym", 2i64);
        params.set("laechg", true);
        params.set("lreal", "Auto");
        params.set("nedos", 3001i64);

        let structure = bulk("Fe");
        let mesh = dense_mesh();

        let (corrected, changes) = validate(&params, &structure, Some(&mesh));
        assert!(!changes.is_empty());

        let (again, second_changes) = validate(&corrected, &structure, Some(&mesh));
        assert_eq!(again, corrected);
        assert!(second_changes.is_empty(), "second pass: {:?}", second_changes);
    }

    #[test]
    fn test_hybrid_relax_with_unset_isym_is_idempotent() {
        // 杂化 + 弛豫、ISYM 未设置：ISYM 相关规则都不该触发，
        // 两次校验结果必须一致
        let mut params = ParameterSet::new();
        params.set("lhfcalc", true);
        params.set("nsw", 99i64);
        params.set("encut", 600i64);

        let structure = bulk("Fe");
        let mesh = dense_mesh();

        let (corrected, _) = validate(&params, &structure, Some(&mesh));
        assert!(!corrected.contains("isym"));

        let (again, second_changes) = validate(&corrected, &structure, Some(&mesh));
        assert_eq!(again, corrected);
        assert!(second_changes.is_empty(), "second pass: {:?}", second_changes);
    }

    #[test]
    fn test_unknown_flags_pass_through() {
        let mut params = ParameterSet::new();
        params.set("nwrite", 3i64);
        params.set("some_future_flag", "value");

        // Si is a p-block nonmetal: none of the structure-driven rules fire
        let (corrected, changes) = validate(&params, &bulk("Si"), Some(&dense_mesh()));

        assert_eq!(corrected.get_int("nwrite"), Some(3));
        assert_eq!(corrected.get_str("some_future_flag"), Some("value"));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_changes_name_the_flag() {
        let mut params = ParameterSet::new();
        params.set("metagga", "R2SCAN");
        params.set("encut", 50i64);

        let (corrected, changes) = validate(&params, &bulk("Cu"), Some(&dense_mesh()));

        assert_eq!(corrected.get_float("encut"), Some(500.0));
        assert!(changes.iter().any(|c| c.flag == "encut"));
    }
}
