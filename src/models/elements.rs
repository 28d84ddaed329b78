//! # 元素周期表静态数据
//!
//! 结构相关约束规则所需的元素属性：区块 (s/p/d/f)、金属性、相对原子质量。
//!
//! ## 依赖关系
//! - 被 `models/structure.rs` 使用
//! - 无外部模块依赖

/// 元素区块
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Block {
    S,
    P,
    D,
    F,
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Block::S => write!(f, "s"),
            Block::P => write!(f, "p"),
            Block::D => write!(f, "d"),
            Block::F => write!(f, "f"),
        }
    }
}

const S_BLOCK: &[&str] = &[
    "H", "He", "Li", "Be", "Na", "Mg", "K", "Ca", "Rb", "Sr", "Cs", "Ba", "Fr", "Ra",
];

const P_BLOCK: &[&str] = &[
    "B", "C", "N", "O", "F", "Ne", "Al", "Si", "P", "S", "Cl", "Ar", "Ga", "Ge", "As", "Se", "Br",
    "Kr", "In", "Sn", "Sb", "Te", "I", "Xe", "Tl", "Pb", "Bi", "Po", "At", "Rn",
];

const D_BLOCK: &[&str] = &[
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Y", "Zr", "Nb", "Mo", "Tc", "Ru",
    "Rh", "Pd", "Ag", "Cd", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
];

// 镧系/锕系统一归入 f 区
const F_BLOCK: &[&str] = &[
    "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu",
    "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr",
];

// 非金属与半金属（用于金属性判断的排除表）
const NONMETALS: &[&str] = &[
    "H", "He", "B", "C", "N", "O", "F", "Ne", "Si", "P", "S", "Cl", "Ar", "Ge", "As", "Se", "Br",
    "Kr", "Sb", "Te", "I", "Xe", "At", "Rn",
];

/// 查询元素所属区块，未知符号返回 None
pub fn block(symbol: &str) -> Option<Block> {
    if F_BLOCK.contains(&symbol) {
        Some(Block::F)
    } else if D_BLOCK.contains(&symbol) {
        Some(Block::D)
    } else if P_BLOCK.contains(&symbol) {
        Some(Block::P)
    } else if S_BLOCK.contains(&symbol) {
        Some(Block::S)
    } else {
        None
    }
}

/// 元素是否为金属（半金属按非金属处理，未知符号视为非金属）
pub fn is_metal(symbol: &str) -> bool {
    block(symbol).is_some() && !NONMETALS.contains(&symbol)
}

/// 相对原子质量 (amu)，未收录的元素返回 None
///
/// 用于偶极修正的质心计算，精度要求不高。
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    let mass = match symbol {
        "H" => 1.008,
        "He" => 4.003,
        "Li" => 6.941,
        "Be" => 9.012,
        "B" => 10.811,
        "C" => 12.011,
        "N" => 14.007,
        "O" => 15.999,
        "F" => 18.998,
        "Ne" => 20.180,
        "Na" => 22.990,
        "Mg" => 24.305,
        "Al" => 26.982,
        "Si" => 28.086,
        "P" => 30.974,
        "S" => 32.065,
        "Cl" => 35.453,
        "Ar" => 39.948,
        "K" => 39.098,
        "Ca" => 40.078,
        "Sc" => 44.956,
        "Ti" => 47.867,
        "V" => 50.942,
        "Cr" => 51.996,
        "Mn" => 54.938,
        "Fe" => 55.845,
        "Co" => 58.933,
        "Ni" => 58.693,
        "Cu" => 63.546,
        "Zn" => 65.38,
        "Ga" => 69.723,
        "Ge" => 72.64,
        "As" => 74.922,
        "Se" => 78.96,
        "Br" => 79.904,
        "Kr" => 83.798,
        "Rb" => 85.468,
        "Sr" => 87.62,
        "Y" => 88.906,
        "Zr" => 91.224,
        "Nb" => 92.906,
        "Mo" => 95.96,
        "Tc" => 98.0,
        "Ru" => 101.07,
        "Rh" => 102.906,
        "Pd" => 106.42,
        "Ag" => 107.868,
        "Cd" => 112.411,
        "In" => 114.818,
        "Sn" => 118.71,
        "Sb" => 121.76,
        "Te" => 127.6,
        "I" => 126.904,
        "Xe" => 131.293,
        "Cs" => 132.905,
        "Ba" => 137.327,
        "La" => 138.905,
        "Ce" => 140.116,
        "Pr" => 140.908,
        "Nd" => 144.242,
        "Pm" => 145.0,
        "Sm" => 150.36,
        "Eu" => 151.964,
        "Gd" => 157.25,
        "Tb" => 158.925,
        "Dy" => 162.5,
        "Ho" => 164.93,
        "Er" => 167.259,
        "Tm" => 168.934,
        "Yb" => 173.054,
        "Lu" => 174.967,
        "Hf" => 178.49,
        "Ta" => 180.948,
        "W" => 183.84,
        "Re" => 186.207,
        "Os" => 190.23,
        "Ir" => 192.217,
        "Pt" => 195.084,
        "Au" => 196.967,
        "Hg" => 200.59,
        "Tl" => 204.383,
        "Pb" => 207.2,
        "Bi" => 208.98,
        "Po" => 209.0,
        "At" => 210.0,
        "Rn" => 222.0,
        "Fr" => 223.0,
        "Ra" => 226.0,
        "Ac" => 227.0,
        "Th" => 232.038,
        "Pa" => 231.036,
        "U" => 238.029,
        "Np" => 237.0,
        "Pu" => 244.0,
        _ => return None,
    };
    Some(mass)
}
