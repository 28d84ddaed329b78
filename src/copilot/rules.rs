//! # Co-pilot 规则表
//!
//! 每条规则 = 名称 + 谓词 + 修正动作。`RULES` 的声明顺序就是求值顺序，
//! 调整顺序属于行为变更。所有规则都带幂等保护：只有当前值确实违反
//! 约束时才写入修正。
//!
//! ## 依赖关系
//! - 被 `copilot/mod.rs` 驱动
//! - 使用 `models/parameters.rs`

use super::{Change, RuleCtx};
use crate::models::{Block, ParameterSet};

/// 一条修正规则
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&mut ParameterSet, &RuleCtx, &mut Vec<Change>),
}

/// 固定顺序的规则表
pub const RULES: &[Rule] = &[
    Rule { name: "lmaxmix_block", apply: lmaxmix_block },
    Rule { name: "lasph_required", apply: lasph_required },
    Rule { name: "lmaxtau_f_element", apply: lmaxtau_f_element },
    Rule { name: "algo_meta_gga", apply: algo_meta_gga },
    Rule { name: "algo_hybrid", apply: algo_hybrid },
    Rule { name: "ismear_metal_relax", apply: ismear_metal_relax },
    Rule { name: "ismear_static_dos", apply: ismear_static_dos },
    Rule { name: "ismear_few_kpoints", apply: ismear_few_kpoints },
    Rule { name: "ismear_line_mode", apply: ismear_line_mode },
    Rule { name: "sigma_tetrahedron", apply: sigma_tetrahedron },
    Rule { name: "kspacing_tetrahedron", apply: kspacing_tetrahedron },
    Rule { name: "laechg_relax", apply: laechg_relax },
    Rule { name: "ldauprint_with_u", apply: ldauprint_with_u },
    Rule { name: "lreal_static", apply: lreal_static },
    Rule { name: "lorbit_spin", apply: lorbit_spin },
    Rule { name: "ncore_incompatible", apply: ncore_incompatible },
    Rule { name: "ncore_small_cell", apply: ncore_small_cell },
    Rule { name: "kpar_few_kpoints", apply: kpar_few_kpoints },
    Rule { name: "isym_relax", apply: isym_relax },
    Rule { name: "isym_hybrid", apply: isym_hybrid },
    Rule { name: "isym_soc", apply: isym_soc },
    Rule { name: "encut_floor", apply: encut_floor },
    Rule { name: "cluster_flags", apply: cluster_flags },
];

// ─── 谓词辅助 ───────────────────────────────────────────────────

/// meta-GGA 泛函已选择
fn has_meta_gga(params: &ParameterSet) -> bool {
    params.get_str("metagga").map_or(false, |s| !s.is_empty())
}

/// 杂化泛函已开启
fn has_hybrid(params: &ParameterSet) -> bool {
    params.truthy("lhfcalc")
}

/// NSW 未设置时按 VASP 默认值 0（静态计算）处理
fn nsw(params: &ParameterSet) -> i64 {
    params.get_int("nsw").unwrap_or(0)
}

fn push(changes: &mut Vec<Change>, flag: &str, note: String) {
    changes.push(Change::new(flag, note));
}

// ─── 规则实现 ───────────────────────────────────────────────────

/// d/f 元素需要足够大的 LMAXMIX（VASP 默认 2）
fn lmaxmix_block(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    let current = params.get_int("lmaxmix").unwrap_or(2);
    match ctx.max_block {
        Some(Block::F) if current < 6 => {
            params.set("lmaxmix", 6i64);
            push(
                changes,
                "lmaxmix",
                "Setting LMAXMIX = 6 because you have an f-element.".to_string(),
            );
        }
        Some(Block::D) if current < 4 => {
            params.set("lmaxmix", 4i64);
            push(
                changes,
                "lmaxmix",
                "Setting LMAXMIX = 4 because you have a d-element.".to_string(),
            );
        }
        _ => {}
    }
}

/// +U / vdW / meta-GGA / 杂化需要非球形贡献
fn lasph_required(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    let needed = params.truthy("ldau")
        || params.truthy("luse_vdw")
        || has_meta_gga(params)
        || has_hybrid(params);

    if needed && !params.truthy("lasph") {
        params.set("lasph", true);
        push(
            changes,
            "lasph",
            "Setting LASPH = True because you are using +U, vdW, a meta-GGA, or a hybrid."
                .to_string(),
        );
    }
}

fn lmaxtau_f_element(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    let has_f = ctx.max_block == Some(Block::F);
    let current = params.get_int("lmaxtau").unwrap_or(6);

    if params.truthy("lasph") && has_f && current < 8 {
        params.set("lmaxtau", 8i64);
        push(
            changes,
            "lmaxtau",
            "Setting LMAXTAU = 8 because you have LASPH = True and an f-element.".to_string(),
        );
    }
}

fn algo_meta_gga(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if !has_meta_gga(params) {
        return;
    }
    let algo = params.get_str("algo").unwrap_or("").to_lowercase();
    if algo != "all" {
        params.set("algo", "All");
        push(
            changes,
            "algo",
            "Setting ALGO = All because you have a meta-GGA calculation.".to_string(),
        );
    }
}

/// 杂化泛函要求 ALGO = All 或 Damped；金属体系优先 Damped
fn algo_hybrid(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if !has_hybrid(params) {
        return;
    }
    let algo = params.get_str("algo").unwrap_or("").to_lowercase();
    if algo == "all" || algo == "damped" {
        return;
    }

    if ctx.is_metal {
        params.set("algo", "Damped");
        params.set("time", 0.5);
        push(
            changes,
            "algo",
            "Setting ALGO = Damped, TIME = 0.5 because this is a likely metal with a hybrid."
                .to_string(),
        );
    } else {
        params.set("algo", "All");
        push(
            changes,
            "algo",
            "Setting ALGO = All because you have a hybrid calculation.".to_string(),
        );
    }
}

fn ismear_metal_relax(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    let ismear = match params.get_int("ismear") {
        Some(v) => v,
        None => return,
    };

    if ctx.is_metal && nsw(params) > 0 && ismear < 0 {
        params.set("ismear", 1i64);
        params.set("sigma", 0.1);
        push(
            changes,
            "ismear",
            "Setting ISMEAR = 1, SIGMA = 0.1 because you are relaxing a likely metal.".to_string(),
        );
    }
}

/// 静态态密度计算优先四面体方法；仅当网格足够密时才切换，
/// 否则后续规则会立刻改回去
fn ismear_static_dos(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if !params.contains("nedos") || nsw(params) != 0 {
        return;
    }
    if params.get_int("ismear") == Some(-5) {
        return;
    }
    if !ctx.periodic || ctx.line_mode() {
        return;
    }

    let mesh_ok = match params.get_float("kspacing") {
        Some(kspacing) => kspacing <= 0.5,
        None => ctx.nkpts() >= 4,
    };
    if mesh_ok {
        params.set("ismear", -5i64);
        push(
            changes,
            "ismear",
            "Setting ISMEAR = -5 because you have a static DOS calculation.".to_string(),
        );
    }
}

fn ismear_few_kpoints(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if params.get_int("ismear") == Some(-5)
        && !params.contains("kspacing")
        && ctx.nkpts() < 4
    {
        params.set("ismear", 0i64);
        push(
            changes,
            "ismear",
            "Setting ISMEAR = 0 because you have less than 4 k-points and ISMEAR = -5 requires at least 4.".to_string(),
        );
    }
}

fn ismear_line_mode(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if ctx.line_mode() && params.get_int("ismear") != Some(0) {
        params.set("ismear", 0i64);
        params.set("sigma", 0.01);
        push(
            changes,
            "ismear",
            "Setting ISMEAR = 0, SIGMA = 0.01 because you are running a line-mode band structure."
                .to_string(),
        );
    }
}

fn sigma_tetrahedron(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if params.get_int("ismear") == Some(-5) {
        if let Some(sigma) = params.get_float("sigma") {
            if sigma > 0.05 {
                params.set("sigma", 0.05);
                push(
                    changes,
                    "sigma",
                    "Setting SIGMA = 0.05 because ISMEAR = -5 ignores larger smearing widths."
                        .to_string(),
                );
            }
        }
    }
}

fn kspacing_tetrahedron(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if let Some(kspacing) = params.get_float("kspacing") {
        if kspacing > 0.5 && params.get_int("ismear") == Some(-5) {
            params.set("ismear", 0i64);
            push(
                changes,
                "ismear",
                "Setting ISMEAR = 0 because the KSPACING mesh is too coarse for ISMEAR = -5."
                    .to_string(),
            );
        }
    }
}

fn laechg_relax(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if nsw(params) > 0 && params.truthy("laechg") {
        params.set("laechg", false);
        push(
            changes,
            "laechg",
            "Setting LAECHG = False because the AECCAR files are only meaningful for static runs."
                .to_string(),
        );
    }
}

fn ldauprint_with_u(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if params.truthy("ldau") && params.get_int("ldauprint").unwrap_or(0) == 0 {
        params.set("ldauprint", 1i64);
        push(
            changes,
            "ldauprint",
            "Setting LDAUPRINT = 1 because you are running a +U calculation.".to_string(),
        );
    }
}

/// LREAL 只在较大体系的弛豫中划算；静态计算用倒空间投影
fn lreal_static(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if nsw(params) <= 1 && params.truthy("lreal") {
        params.set("lreal", false);
        push(
            changes,
            "lreal",
            "Setting LREAL = False because this is a static calculation.".to_string(),
        );
    }
}

fn lorbit_spin(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    let spin_polarized = params.get_int("ispin") == Some(2) || ctx.magmom_hint;

    if spin_polarized && !params.contains("lorbit") {
        params.set("lorbit", 11i64);
        push(
            changes,
            "lorbit",
            "Setting LORBIT = 11 because this is a spin-polarized calculation.".to_string(),
        );
    }
}

/// 这些模式下 VASP 要求串行轨道并行化
fn ncore_incompatible(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    let ibrion = params.get_int("ibrion").unwrap_or(-1);
    let incompatible = has_hybrid(params)
        || params.truthy("lrpa")
        || params.truthy("lepsilon")
        || (5..=8).contains(&ibrion);

    if incompatible && parallel_orbitals(params) {
        force_serial_orbitals(params);
        push(
            changes,
            "ncore",
            "Setting NCORE = 1 and removing NPAR because they are incompatible with this calculation type.".to_string(),
        );
    }
}

fn ncore_small_cell(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if ctx.n_atoms <= 4 && parallel_orbitals(params) {
        force_serial_orbitals(params);
        push(
            changes,
            "ncore",
            "Setting NCORE = 1 and removing NPAR because your system has few atoms.".to_string(),
        );
    }
}

fn parallel_orbitals(params: &ParameterSet) -> bool {
    params.get_int("ncore").unwrap_or(1) > 1 || params.get_int("npar").unwrap_or(1) > 1
}

fn force_serial_orbitals(params: &mut ParameterSet) {
    params.set("ncore", 1i64);
    params.remove("npar");
}

fn kpar_few_kpoints(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if let Some(kpar) = params.get_int("kpar") {
        if kpar > 1 && !params.contains("kspacing") && (kpar as u64) > ctx.nkpts() {
            params.set("kpar", 1i64);
            push(
                changes,
                "kpar",
                "Setting KPAR = 1 because you have more k-point groups than k-points.".to_string(),
            );
        }
    }
}

fn isym_relax(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if nsw(params) > 0 && params.get_int("isym").unwrap_or(0) > 0 {
        params.set("isym", 0i64);
        push(
            changes,
            "isym",
            "Setting ISYM = 0 because you are running a relaxation.".to_string(),
        );
    }
}

/// 仅当用户显式给出 ISYM = 1/2 时改写；未设置不算违反约束，
/// 否则与弛豫规则（ISYM > 0 -> 0）形成往复改写
fn isym_hybrid(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if has_hybrid(params) && matches!(params.get_int("isym"), Some(1) | Some(2)) {
        params.set("isym", 3i64);
        push(
            changes,
            "isym",
            "Setting ISYM = 3 because you are running a hybrid calculation.".to_string(),
        );
    }
}

fn isym_soc(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if params.truthy("lsorbit") && params.get_int("isym") != Some(-1) {
        params.set("isym", -1i64);
        push(
            changes,
            "isym",
            "Setting ISYM = -1 because you are running with spin-orbit coupling.".to_string(),
        );
    }
}

fn encut_floor(params: &mut ParameterSet, _ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if !(has_meta_gga(params) || has_hybrid(params)) {
        return;
    }
    if let Some(encut) = params.get_float("encut") {
        if encut < 500.0 {
            params.set("encut", 500i64);
            push(
                changes,
                "encut",
                "Setting ENCUT = 500 because meta-GGA and hybrid calculations need a higher plane-wave cutoff.".to_string(),
            );
        }
    }
}

/// 孤立体系：纯 Γ 点计算，周期性相关 flag 无意义
fn cluster_flags(params: &mut ParameterSet, ctx: &RuleCtx, changes: &mut Vec<Change>) {
    if ctx.periodic {
        return;
    }

    if params.contains("kspacing") {
        params.remove("kspacing");
        push(
            changes,
            "kspacing",
            "Removing KSPACING because your structure is non-periodic.".to_string(),
        );
    }
    if params.contains("kpar") {
        params.remove("kpar");
        push(
            changes,
            "kpar",
            "Removing KPAR because your structure is non-periodic.".to_string(),
        );
    }
    if params.get_int("ismear") == Some(-5) {
        params.set("ismear", 0i64);
        push(
            changes,
            "ismear",
            "Setting ISMEAR = 0 because ISMEAR = -5 does not apply to a non-periodic structure."
                .to_string(),
        );
    }
}
