//! # 晶体结构数据模型
//!
//! 定义统一的原子结构表示。本工具只读取元素种类、数目、几何与周期性边界条件，
//! 用于评估结构相关的输入约束；不做任何结构修改或分析。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `copilot/`, `calculators/` 使用
//! - 使用 `models/elements.rs`

use crate::models::elements::{self, Block};
use serde::{Deserialize, Serialize};

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let alpha_rad = alpha.to_radians();
        let beta_rad = beta.to_radians();
        let gamma_rad = gamma.to_radians();

        let cos_alpha = alpha_rad.cos();
        let cos_beta = beta_rad.cos();
        let cos_gamma = gamma_rad.cos();
        let sin_gamma = gamma_rad.sin();

        let a_vec = [a, 0.0, 0.0];
        let b_vec = [b * cos_gamma, b * sin_gamma, 0.0];

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();
        let c_vec = [c1, c2, c3];

        Lattice {
            matrix: [a_vec, b_vec, c_vec],
        }
    }

    /// 三个晶格向量的长度 (Å)
    pub fn abc(&self) -> [f64; 3] {
        let norm = |v: &[f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        [
            norm(&self.matrix[0]),
            norm(&self.matrix[1]),
            norm(&self.matrix[2]),
        ]
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a, b, c] = self.abc();
        let a_vec = self.matrix[0];
        let b_vec = self.matrix[1];
        let c_vec = self.matrix[2];

        let dot_bc: f64 = b_vec.iter().zip(c_vec.iter()).map(|(x, y)| x * y).sum();
        let dot_ac: f64 = a_vec.iter().zip(c_vec.iter()).map(|(x, y)| x * y).sum();
        let dot_ab: f64 = a_vec.iter().zip(b_vec.iter()).map(|(x, y)| x * y).sum();

        let alpha = (dot_bc / (b * c)).acos().to_degrees();
        let beta = (dot_ac / (a * c)).acos().to_degrees();
        let gamma = (dot_ab / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积 (Å³)
    pub fn volume(&self) -> f64 {
        let a = self.matrix[0];
        let b = self.matrix[1];
        let c = self.matrix[2];

        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 是否为六方晶格（a ≈ b, alpha ≈ beta ≈ 90°, gamma ≈ 120°）
    ///
    /// 自动 k 点网格是否 Γ 心化需要此判断。
    pub fn is_hexagonal(&self) -> bool {
        let (a, b, _, alpha, beta, gamma) = self.parameters();
        let close = |x: f64, y: f64, tol: f64| (x - y).abs() < tol;

        close(a, b, 1e-3 * a.max(b)) && close(alpha, 90.0, 0.5) && close(beta, 90.0, 0.5)
            && close(gamma, 120.0, 0.5)
    }
}

/// 原子信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 原子结构（晶体或团簇）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 三个方向的周期性边界条件
    pub pbc: [bool; 3],

    /// 初始磁矩（与 atoms 等长），未设置时为 None
    pub initial_magmoms: Option<Vec<f64>>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
            pbc: [true, true, true],
            initial_magmoms: None,
        }
    }

    /// 标记为非周期（团簇/分子）结构
    pub fn as_cluster(mut self) -> Self {
        self.pbc = [false, false, false];
        self
    }

    /// 三个方向均为周期性边界
    pub fn is_periodic(&self) -> bool {
        self.pbc.iter().all(|&p| p)
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 结构中最高的元素区块（f > d > p > s）
    pub fn highest_block(&self) -> Option<Block> {
        self.atoms
            .iter()
            .filter_map(|a| elements::block(&a.element))
            .max()
    }

    /// 所有元素均为金属时判定为"疑似金属"
    pub fn is_likely_metal(&self) -> bool {
        !self.atoms.is_empty() && self.atoms.iter().all(|a| elements::is_metal(&a.element))
    }

    /// 是否存在非零初始磁矩
    pub fn has_nonzero_magmoms(&self) -> bool {
        self.initial_magmoms
            .as_ref()
            .map(|mags| mags.iter().any(|m| *m != 0.0))
            .unwrap_or(false)
    }

    /// 质心（分数坐标，按原子质量加权；未收录的质量按 1.0 处理）
    pub fn center_of_mass(&self) -> [f64; 3] {
        let mut total = 0.0;
        let mut com = [0.0; 3];

        for atom in &self.atoms {
            let m = elements::atomic_mass(&atom.element).unwrap_or(1.0);
            total += m;
            for i in 0..3 {
                com[i] += m * atom.position[i];
            }
        }

        if total > 0.0 {
            for c in com.iter_mut() {
                *c /= total;
            }
        }
        com
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(a: f64) -> Lattice {
        Lattice::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    #[test]
    fn test_lattice_abc_and_volume() {
        let lattice = cubic(5.0);
        let [a, b, c] = lattice.abc();

        assert!((a - 5.0).abs() < 1e-9);
        assert!((b - 5.0).abs() < 1e-9);
        assert!((c - 5.0).abs() < 1e-9);
        assert!((lattice.volume().abs() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_lattice_hexagonal_detection() {
        let hex = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        assert!(hex.is_hexagonal());
        assert!(!cubic(4.0).is_hexagonal());
    }

    #[test]
    fn test_crystal_periodicity() {
        let bulk = Crystal::new("Fe", cubic(2.87), vec![Atom::new("Fe", [0.0; 3])]);
        assert!(bulk.is_periodic());

        let cluster = bulk.clone().as_cluster();
        assert!(!cluster.is_periodic());
        assert_eq!(cluster.pbc, [false, false, false]);
    }

    #[test]
    fn test_highest_block() {
        let atoms = vec![
            Atom::new("Ce", [0.0, 0.0, 0.0]),
            Atom::new("O", [0.5, 0.5, 0.5]),
        ];
        let ceria = Crystal::new("CeO2", cubic(5.4), atoms);
        assert_eq!(ceria.highest_block(), Some(Block::F));

        let nacl = Crystal::new(
            "NaCl",
            cubic(5.64),
            vec![
                Atom::new("Na", [0.0; 3]),
                Atom::new("Cl", [0.5, 0.5, 0.5]),
            ],
        );
        assert_eq!(nacl.highest_block(), Some(Block::P));
    }

    #[test]
    fn test_is_likely_metal() {
        let fe = Crystal::new("Fe", cubic(2.87), vec![Atom::new("Fe", [0.0; 3])]);
        assert!(fe.is_likely_metal());

        let feo = Crystal::new(
            "FeO",
            cubic(4.3),
            vec![Atom::new("Fe", [0.0; 3]), Atom::new("O", [0.5, 0.5, 0.5])],
        );
        assert!(!feo.is_likely_metal());
    }

    #[test]
    fn test_nonzero_magmoms() {
        let mut fe = Crystal::new("Fe", cubic(2.87), vec![Atom::new("Fe", [0.0; 3])]);
        assert!(!fe.has_nonzero_magmoms());

        fe.initial_magmoms = Some(vec![0.0]);
        assert!(!fe.has_nonzero_magmoms());

        fe.initial_magmoms = Some(vec![5.0]);
        assert!(fe.has_nonzero_magmoms());
    }

    #[test]
    fn test_center_of_mass_equal_masses() {
        let atoms = vec![
            Atom::new("Cu", [0.0, 0.0, 0.0]),
            Atom::new("Cu", [0.5, 0.5, 0.5]),
        ];
        let crystal = Crystal::new("Cu2", cubic(3.6), atoms);
        let com = crystal.center_of_mass();

        for c in com {
            assert!((c - 0.25).abs() < 1e-9);
        }
    }
}
