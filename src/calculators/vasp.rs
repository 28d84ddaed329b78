//! # VASP 计算器工厂
//!
//! 装配顺序是严格的：预设默认值 → 用户覆盖 → co-pilot 修正（最终裁决）。
//! 在此之前先拆出特殊键（`setups` / `kpts`）、生成自动 k 点网格、
//! 处理偶极修正与初始磁矩；在此之后删除无效 flag 组并选择启动命令。
//!
//! 装配完成后 `VaspCalculator` 不再修改，字段即为最终输入。
//!
//! ## 依赖关系
//! - 被 `commands/incar.rs` 使用
//! - 使用 `defaults/`, `copilot/`, `models/`, `parsers/`, `settings.rs`

use crate::copilot::{self, Change, KpointMesh};
use crate::defaults::{self, AutoKpts, Preset};
use crate::error::{Result, VaspilotError};
use crate::models::{Crystal, ParamValue, ParameterSet};
use crate::parsers::{incar, kpoints};
use crate::settings::Settings;
use std::collections::BTreeMap;
use std::path::Path;

/// NSW = 0 时失效的弛豫相关 flag
const RELAX_FLAGS: &[&str] = &["ediffg", "ibrion", "isif", "potim", "iopt"];

/// LDAU 关闭时失效的 +U flag 组
const LDAU_FLAGS: &[&str] = &[
    "ldau", "ldauu", "ldauj", "ldaul", "ldautype", "ldauprint", "ldau_luj",
];

/// 工厂选项
///
/// `copilot` / `custodian` 为 None 时沿用全局设置。
#[derive(Debug, Clone, Default)]
pub struct VaspOptions {
    /// 预设名或 YAML 路径
    pub preset: Option<String>,
    pub copilot: Option<bool>,
    pub custodian: Option<bool>,
}

/// 装配完成的 VASP 计算输入
#[derive(Debug, Clone)]
pub struct VaspCalculator {
    /// 绑定的结构（初始磁矩已写入）
    pub structure: Crystal,

    /// 最终参数集
    pub parameters: ParameterSet,

    /// k 点网格；None 表示 Γ 点或由 KSPACING 驱动
    pub kpoints: Option<KpointMesh>,

    /// 元素 -> 赝势 setup 后缀
    pub setups: BTreeMap<String, String>,

    /// 启动命令
    pub command: String,

    /// co-pilot 修正记录
    pub changes: Vec<Change>,

    /// 环境相关警告（不致命）
    pub warnings: Vec<String>,
}

impl VaspCalculator {
    /// 渲染 INCAR 文本
    pub fn incar(&self) -> String {
        incar::to_incar_string(&self.parameters)
    }

    /// 渲染 KPOINTS 文本；Γ 点/KSPACING 计算无 KPOINTS 文件
    pub fn kpoints_file(&self) -> Option<String> {
        self.kpoints
            .as_ref()
            .filter(|k| !k.line_mode)
            .map(kpoints::to_kpoints_string)
    }
}

/// 装配 VASP 计算器
pub fn build(
    structure: Crystal,
    settings: &Settings,
    options: &VaspOptions,
    overrides: &ParameterSet,
) -> Result<VaspCalculator> {
    let preset = match &options.preset {
        Some(name) => defaults::load_preset(name)?,
        None => empty_preset(),
    };

    // 预设默认值 -> 用户覆盖
    let mut params = preset.parameters.merge(overrides);

    let mut setups = preset.setups.clone();
    apply_custom_setups(&mut params, &mut setups)?;

    // 显式 kpts 压制预设的 auto_kpts
    let explicit_kpts = extract_kpts(&mut params)?;
    let mut kpts = match explicit_kpts {
        Some(mesh) => Some(mesh),
        None => preset
            .auto_kpts
            .as_ref()
            .map(|auto| generate_mesh(auto, &structure))
            .transpose()?
            .flatten(),
    };
    if !structure.is_periodic() {
        // 孤立体系只做 Γ 点计算
        kpts = None;
    }

    if preset.auto_dipole {
        apply_auto_dipole(&mut params, &structure);
    }

    let structure = assign_magmoms(structure, &preset, settings);
    sync_spin_flags(&mut params, &structure);

    // co-pilot 修正拥有最终裁决权
    let use_copilot = options.copilot.unwrap_or(settings.incar_copilot);
    let changes = if use_copilot {
        let (corrected, changes) = copilot::validate(&params, &structure, kpts.as_ref());
        params = corrected;
        changes
    } else {
        Vec::new()
    };

    remove_unused_flags(&mut params);

    let use_custodian = options.custodian.unwrap_or(settings.vasp_custodian);
    let command = select_command(
        settings,
        use_custodian,
        kpts.as_ref(),
        &params,
        structure.is_periodic(),
    );
    let warnings = collect_env_warnings(&params);

    Ok(VaspCalculator {
        structure,
        parameters: params,
        kpoints: kpts,
        setups,
        command,
        changes,
        warnings,
    })
}

fn empty_preset() -> Preset {
    Preset {
        name: String::new(),
        parameters: ParameterSet::new(),
        elemental_magmoms: BTreeMap::new(),
        setups: BTreeMap::new(),
        auto_kpts: None,
        auto_dipole: false,
    }
}

/// `setups` 覆盖值是一个 YAML 路径（元素 -> setup 的平面映射）
fn apply_custom_setups(
    params: &mut ParameterSet,
    setups: &mut BTreeMap<String, String>,
) -> Result<()> {
    let path = match params.remove("setups") {
        Some(ParamValue::Str(path)) => path,
        Some(other) => {
            return Err(VaspilotError::InvalidArgument(format!(
                "setups must be a YAML file path, got '{}'",
                other
            )))
        }
        None => return Ok(()),
    };

    let content =
        std::fs::read_to_string(&path).map_err(|e| VaspilotError::FileReadError {
            path: path.clone(),
            source: e,
        })?;
    let custom: BTreeMap<String, String> =
        serde_yaml::from_str(&content).map_err(|e| VaspilotError::YamlParseError {
            path: path.clone(),
            source: e,
        })?;

    for (element, setup) in custom {
        let suffix = setup
            .strip_prefix(element.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(setup);
        setups.insert(element, suffix);
    }
    Ok(())
}

/// 从参数集中取出显式 `kpts` 值
fn extract_kpts(params: &mut ParameterSet) -> Result<Option<KpointMesh>> {
    let value = match params.remove("kpts") {
        Some(v) => v,
        None => return Ok(None),
    };

    let floats = match value {
        ParamValue::FloatList(v) => v,
        other => {
            return Err(VaspilotError::InvalidArgument(format!(
                "kpts must be a list of three mesh divisions, got '{}'",
                other
            )))
        }
    };
    if floats.len() != 3 || floats.iter().any(|&x| x < 1.0) {
        return Err(VaspilotError::InvalidArgument(format!(
            "kpts must be three divisions >= 1, got [{}]",
            floats
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let mesh = [
        floats[0].round() as u32,
        floats[1].round() as u32,
        floats[2].round() as u32,
    ];
    Ok(Some(KpointMesh {
        gamma: force_gamma(mesh, false),
        mesh,
        line_mode: false,
    }))
}

/// 六方晶格或含奇数分割的网格必须 Γ 心化
fn force_gamma(mesh: [u32; 3], hexagonal: bool) -> bool {
    hexagonal || mesh.iter().any(|n| n % 2 == 1)
}

/// 根据 auto_kpts 方案生成网格
fn generate_mesh(auto: &AutoKpts, structure: &Crystal) -> Result<Option<KpointMesh>> {
    let [a, b, c] = structure.lattice.abc();
    let hexagonal = structure.lattice.is_hexagonal();

    if let Some(kppa) = auto.grid_density {
        // 每原子 k 点密度 -> 各方向分割数与晶格长度成反比
        let n_atoms = structure.atoms.len().max(1) as f64;
        let ngrid = kppa / n_atoms;
        let mult = (ngrid * a * b * c).powf(1.0 / 3.0);
        let div = |l: f64| ((mult / l).floor() as u32).max(1);
        let mesh = [div(a), div(b), div(c)];

        return Ok(Some(KpointMesh {
            gamma: force_gamma(mesh, hexagonal),
            mesh,
            line_mode: false,
        }));
    }

    if let Some(density) = auto.length_density {
        let div = |d: f64, l: f64| ((d / l).ceil() as u32).max(1);
        let mesh = [div(density[0], a), div(density[1], b), div(density[2], c)];

        return Ok(Some(KpointMesh {
            gamma: force_gamma(mesh, hexagonal),
            mesh,
            line_mode: false,
        }));
    }

    if auto.line_density.is_some() {
        // 路径点由外部能带工具生成；这里只标记线模式
        return Ok(Some(KpointMesh {
            mesh: [1, 1, 1],
            gamma: true,
            line_mode: true,
        }));
    }

    Ok(None)
}

/// 偶极修正：质心作为参考点，仅填充用户未设置的 flag
fn apply_auto_dipole(params: &mut ParameterSet, structure: &Crystal) {
    if !params.contains("dipol") {
        let com = structure.center_of_mass();
        params.set("dipol", vec![com[0], com[1], com[2]]);
    }
    if !params.contains("idipol") {
        params.set("idipol", 3i64);
    }
    if !params.contains("ldipol") {
        params.set("ldipol", true);
    }
}

/// 初始磁矩：结构自带 > 预设元素表（缺失补默认值）> 不设置。
/// 绝对值全部低于阈值时清零（按非自旋极化处理）。
fn assign_magmoms(mut structure: Crystal, preset: &Preset, settings: &Settings) -> Crystal {
    let magmoms: Option<Vec<f64>> = if structure.has_nonzero_magmoms() {
        structure.initial_magmoms.clone()
    } else if !preset.elemental_magmoms.is_empty() {
        Some(
            structure
                .atoms
                .iter()
                .map(|atom| {
                    preset
                        .elemental_magmoms
                        .get(&atom.element)
                        .copied()
                        .unwrap_or(settings.preset_mag_default)
                })
                .collect(),
        )
    } else {
        None
    };

    structure.initial_magmoms = magmoms.map(|mags| {
        if mags.iter().all(|m| m.abs() < settings.mag_cutoff) {
            vec![0.0; mags.len()]
        } else {
            mags
        }
    });
    structure
}

/// 磁矩非零时补写 MAGMOM / ISPIN（用户显式值优先）
fn sync_spin_flags(params: &mut ParameterSet, structure: &Crystal) {
    if !structure.has_nonzero_magmoms() {
        return;
    }
    if let Some(mags) = &structure.initial_magmoms {
        if !params.contains("magmom") {
            params.set("magmom", mags.clone());
        }
        if !params.contains("ispin") {
            params.set("ispin", 2i64);
        }
    }
}

/// 删除当前计算类型下无效的 flag 组
fn remove_unused_flags(params: &mut ParameterSet) {
    if params.get_int("nsw").unwrap_or(0) == 0 {
        for flag in RELAX_FLAGS {
            params.remove(flag);
        }
    }
    if !params.truthy("ldau") {
        for flag in LDAU_FLAGS {
            params.remove(flag);
        }
    }
}

/// 选择启动命令：custodian shim 或直接 VASP 命令
///
/// Γ 点专用二进制只在网格确为 1x1x1（或孤立体系）且未用 KSPACING
/// 驱动网格时选用。
fn select_command(
    settings: &Settings,
    use_custodian: bool,
    kpts: Option<&KpointMesh>,
    params: &ParameterSet,
    periodic: bool,
) -> String {
    if use_custodian {
        // shim 可执行文件与主程序同目录
        let shim = std::env::current_exe()
            .ok()
            .and_then(|exe| {
                exe.parent()
                    .map(|dir| dir.join("run_vasp_custodian").display().to_string())
            })
            .unwrap_or_else(|| "run_vasp_custodian".to_string());

        return match &settings.vasp_custodian_settings {
            Some(path) => format!("VASP_CUSTODIAN_SETTINGS={} {}", path.display(), shim),
            None => shim,
        };
    }

    let gamma_only = !params.contains("kspacing")
        && match kpts {
            Some(mesh) => !mesh.line_mode && mesh.mesh == [1, 1, 1],
            // 无网格信息：只有孤立体系才可确认为 Γ 点计算
            None => !periodic,
        };
    let vasp = if gamma_only {
        &settings.vasp_gamma_cmd
    } else {
        &settings.vasp_cmd
    };

    if settings.vasp_parallel_cmd.is_empty() {
        vasp.clone()
    } else {
        format!("{} {}", settings.vasp_parallel_cmd, vasp)
    }
}

fn collect_env_warnings(params: &ParameterSet) -> Vec<String> {
    let mut warnings = Vec::new();

    if std::env::var_os("VASP_PP_PATH").is_none() {
        warnings
            .push("VASP_PP_PATH is not set; POTCAR generation will fail downstream.".to_string());
    }
    if params.truthy("luse_vdw") && std::env::var_os("VASP_VDW_KERNEL").is_none() {
        warnings.push(
            "LUSE_VDW is set but VASP_VDW_KERNEL is not; the vdW kernel file will be missing."
                .to_string(),
        );
    }

    warnings
}

/// 便捷入口：从 POSCAR 路径装配
pub fn build_from_file(
    structure_path: &Path,
    settings: &Settings,
    options: &VaspOptions,
    overrides: &ParameterSet,
) -> Result<VaspCalculator> {
    let structure = crate::parsers::poscar::parse_poscar_file(structure_path)?;
    build(structure, settings, options, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn quiet_settings() -> Settings {
        Settings {
            vasp_custodian: false,
            ..Settings::default()
        }
    }

    fn bulk_cu() -> Crystal {
        let lattice = Lattice::from_vectors([[3.6, 0.0, 0.0], [0.0, 3.6, 0.0], [0.0, 0.0, 3.6]]);
        Crystal::new(
            "Cu",
            lattice,
            vec![
                Atom::new("Cu", [0.0, 0.0, 0.0]),
                Atom::new("Cu", [0.5, 0.5, 0.0]),
                Atom::new("Cu", [0.5, 0.0, 0.5]),
                Atom::new("Cu", [0.0, 0.5, 0.5]),
            ],
        )
    }

    fn bulk_fe_o() -> Crystal {
        let lattice = Lattice::from_vectors([[4.3, 0.0, 0.0], [0.0, 4.3, 0.0], [0.0, 0.0, 4.3]]);
        Crystal::new(
            "FeO",
            lattice,
            vec![
                Atom::new("Fe", [0.0, 0.0, 0.0]),
                Atom::new("O", [0.5, 0.5, 0.5]),
            ],
        )
    }

    #[test]
    fn test_merge_order_preset_then_overrides() {
        let mut overrides = ParameterSet::new();
        overrides.set("encut", 650i64);
        overrides.set("nsw", 0i64);

        let options = VaspOptions {
            preset: Some("BulkSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_cu(), &quiet_settings(), &options, &overrides).unwrap();

        // override wins over the preset
        assert_eq!(calc.parameters.get_int("encut"), Some(650));
        // untouched preset value survives
        assert_eq!(calc.parameters.get_str("prec"), Some("Accurate"));
    }

    #[test]
    fn test_copilot_overrules_bad_override() {
        // the preset requires encut >= 500 for a meta-GGA; the override
        // violates that and must end up corrected, not kept
        let mut overrides = ParameterSet::new();
        overrides.set("encut", 50i64);

        let options = VaspOptions {
            preset: Some("MPScanSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_fe_o(), &quiet_settings(), &options, &overrides).unwrap();

        assert_eq!(calc.parameters.get_int("encut"), Some(500));
        assert!(calc.changes.iter().any(|c| c.flag == "encut"));
    }

    #[test]
    fn test_copilot_disabled_keeps_override() {
        let mut overrides = ParameterSet::new();
        overrides.set("encut", 50i64);

        let options = VaspOptions {
            preset: Some("MPScanSet".to_string()),
            copilot: Some(false),
            ..Default::default()
        };
        let calc = build(bulk_fe_o(), &quiet_settings(), &options, &overrides).unwrap();

        assert_eq!(calc.parameters.get_int("encut"), Some(50));
        assert!(calc.changes.is_empty());
    }

    #[test]
    fn test_unknown_preset_is_fatal() {
        let options = VaspOptions {
            preset: Some("NoSuchSet".to_string()),
            ..Default::default()
        };
        let err = build(bulk_cu(), &quiet_settings(), &options, &ParameterSet::new()).unwrap_err();
        assert!(err.to_string().contains("NoSuchSet"));
    }

    #[test]
    fn test_grid_density_mesh() {
        let options = VaspOptions {
            preset: Some("BulkSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_cu(), &quiet_settings(), &options, &ParameterSet::new()).unwrap();

        // kppa = 1000, 4 atoms, cubic 3.6 Å cell -> isotropic mesh
        let mesh = calc.kpoints.unwrap();
        assert_eq!(mesh.mesh[0], mesh.mesh[1]);
        assert_eq!(mesh.mesh[1], mesh.mesh[2]);
        assert!(mesh.mesh[0] >= 4);
    }

    #[test]
    fn test_explicit_kpts_suppress_auto_kpts() {
        let mut overrides = ParameterSet::new();
        overrides.set("kpts", vec![2.0, 2.0, 2.0]);

        let options = VaspOptions {
            preset: Some("BulkSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_cu(), &quiet_settings(), &options, &overrides).unwrap();

        let mesh = calc.kpoints.unwrap();
        assert_eq!(mesh.mesh, [2, 2, 2]);
        assert!(!mesh.gamma);
        // kpts is not a real INCAR flag and must not leak into the output
        assert!(!calc.parameters.contains("kpts"));
    }

    #[test]
    fn test_length_density_slab_mesh() {
        let lattice =
            Lattice::from_vectors([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 20.0]]);
        let slab = Crystal::new(
            "Cu slab",
            lattice,
            vec![Atom::new("Cu", [0.0, 0.0, 0.2]), Atom::new("Cu", [0.5, 0.5, 0.3])],
        );

        let options = VaspOptions {
            preset: Some("SlabSet".to_string()),
            ..Default::default()
        };
        let calc = build(slab, &quiet_settings(), &options, &ParameterSet::new()).unwrap();

        // [50, 50, 1] / [3, 3, 20] -> dense in-plane, single division along z
        let mesh = calc.kpoints.as_ref().unwrap();
        assert_eq!(mesh.mesh, [17, 17, 1]);
        assert!(mesh.gamma);
    }

    #[test]
    fn test_auto_dipole_fills_unset_flags() {
        let options = VaspOptions {
            preset: Some("SlabSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_cu(), &quiet_settings(), &options, &ParameterSet::new()).unwrap();

        assert!(calc.parameters.contains("dipol"));
        assert_eq!(calc.parameters.get_int("idipol"), Some(3));
        assert_eq!(calc.parameters.get_bool("ldipol"), Some(true));
    }

    #[test]
    fn test_elemental_magmoms_with_default_fill() {
        let options = VaspOptions {
            preset: Some("BulkSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_fe_o(), &quiet_settings(), &options, &ParameterSet::new()).unwrap();

        // Fe from the preset table, O filled with the default
        assert_eq!(calc.structure.initial_magmoms, Some(vec![5.0, 1.0]));
        assert_eq!(calc.parameters.get_int("ispin"), Some(2));
        assert!(calc.parameters.contains("magmom"));
    }

    #[test]
    fn test_magmoms_below_cutoff_zeroed() {
        let mut structure = bulk_fe_o();
        structure.initial_magmoms = Some(vec![0.01, 0.02]);

        let options = VaspOptions::default();
        let calc = build(structure, &quiet_settings(), &options, &ParameterSet::new()).unwrap();

        assert_eq!(calc.structure.initial_magmoms, Some(vec![0.0, 0.0]));
        assert!(!calc.parameters.contains("magmom"));
        assert!(!calc.parameters.contains("ispin"));
    }

    #[test]
    fn test_cluster_loses_periodic_flags() {
        let molecule = bulk_fe_o().as_cluster();
        let mut overrides = ParameterSet::new();
        overrides.set("kspacing", 0.3);
        overrides.set("ismear", -5i64);

        let calc = build(molecule, &quiet_settings(), &VaspOptions::default(), &overrides).unwrap();

        assert!(calc.kpoints.is_none());
        assert!(!calc.parameters.contains("kspacing"));
        assert_eq!(calc.parameters.get_int("ismear"), Some(0));
    }

    #[test]
    fn test_static_run_drops_relax_flags() {
        let mut overrides = ParameterSet::new();
        overrides.set("nsw", 0i64);

        let options = VaspOptions {
            preset: Some("BulkSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_cu(), &quiet_settings(), &options, &overrides).unwrap();

        assert!(!calc.parameters.contains("ibrion"));
        assert!(!calc.parameters.contains("isif"));
        assert!(!calc.parameters.contains("ediffg"));
    }

    #[test]
    fn test_ldau_block_removed_without_u() {
        let mut overrides = ParameterSet::new();
        overrides.set("ldauu", "4.0 0.0");
        overrides.set("ldauprint", 1i64);

        let calc = build(
            bulk_fe_o(),
            &quiet_settings(),
            &VaspOptions::default(),
            &overrides,
        )
        .unwrap();

        assert!(!calc.parameters.contains("ldauu"));
        assert!(!calc.parameters.contains("ldauprint"));
    }

    #[test]
    fn test_direct_command_uses_gamma_binary_for_cluster() {
        let molecule = bulk_fe_o().as_cluster();
        let calc = build(
            molecule,
            &quiet_settings(),
            &VaspOptions::default(),
            &ParameterSet::new(),
        )
        .unwrap();

        assert_eq!(calc.command, "vasp_gam");
    }

    #[test]
    fn test_kspacing_run_uses_standard_binary() {
        // KSPACING implies a dense mesh even though no explicit KpointMesh
        // exists; the gamma-only binary cannot run it
        let mut overrides = ParameterSet::new();
        overrides.set("kspacing", 0.2);

        let calc = build(
            bulk_cu(),
            &quiet_settings(),
            &VaspOptions::default(),
            &overrides,
        )
        .unwrap();

        assert!(calc.kpoints.is_none());
        assert_eq!(calc.command, "vasp_std");
    }

    #[test]
    fn test_explicit_gamma_mesh_uses_gamma_binary() {
        let mut overrides = ParameterSet::new();
        overrides.set("kpts", vec![1.0, 1.0, 1.0]);

        let calc = build(
            bulk_cu(),
            &quiet_settings(),
            &VaspOptions::default(),
            &overrides,
        )
        .unwrap();

        assert_eq!(calc.command, "vasp_gam");
    }

    #[test]
    fn test_parallel_prefix_prepended() {
        let settings = Settings {
            vasp_custodian: false,
            vasp_parallel_cmd: "srun -N 2".to_string(),
            ..Settings::default()
        };
        let options = VaspOptions {
            preset: Some("BulkSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_cu(), &settings, &options, &ParameterSet::new()).unwrap();

        assert_eq!(calc.command, "srun -N 2 vasp_std");
    }

    #[test]
    fn test_custodian_command_points_at_shim() {
        let settings = Settings::default();
        let calc = build(
            bulk_cu(),
            &settings,
            &VaspOptions::default(),
            &ParameterSet::new(),
        )
        .unwrap();

        assert!(calc.command.ends_with("run_vasp_custodian"));
    }

    #[test]
    fn test_incar_rendering_round_trip() {
        let options = VaspOptions {
            preset: Some("BulkSet".to_string()),
            ..Default::default()
        };
        let calc = build(bulk_cu(), &quiet_settings(), &options, &ParameterSet::new()).unwrap();

        let reparsed = crate::parsers::incar::parse_incar_content(&calc.incar()).unwrap();
        assert_eq!(reparsed, calc.parameters);
    }
}
