use molforce::{
    geometry::TorsionGeometry,
    kernels::{compute_energy_dihedral, compute_force_dihedral, DihedralInputs},
    AtomId, Bounds, Device, DeviceError, DeviceParameterStore, DeviceProperties, DihedralConfig,
    DihedralOplsEvaluator, DihedralOplsPotential, DihedralOplsType, DihedralRecord, ForceError,
    GlobalArray, ParticleState, SharedParamPolicy, Vec3, Vec4,
};

// ============================================================================
// Helpers
// ============================================================================

fn assert_vec_approx_eq(actual: Vec3, expected: Vec3, tol: f32, msg: &str) {
    let diff = (actual - expected).length();
    assert!(
        diff < tol,
        "{msg}: expected {expected}, got {actual} (diff={diff}, tol={tol})"
    );
}

const TYPE_COEFS: [[f32; 4]; 3] = [
    [1.3, -0.4, 0.7, 0.2],
    [0.5, 0.9, -0.3, 0.0],
    [-0.8, 0.1, 0.4, 0.6],
];

fn helix(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let t = 1.1 * i as f32;
            Vec3::new(1.5 * t.cos(), 1.5 * t.sin(), 0.9 * i as f32)
        })
        .collect()
}

fn gauche() -> [Vec3; 4] {
    [
        Vec3::new(1.2, 0.9, 0.3),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.5, 0.0),
        Vec3::new(-1.1, 1.9, 0.8),
    ]
}

fn inline_coefs(i: usize) -> [f32; 4] {
    [0.2 * i as f32 / 300.0, 0.3, -0.1, 0.05]
}

// Coefficients used by dihedral `i` of the helix chain.
fn chain_coefs(i: usize) -> [f32; 4] {
    if i % 5 == 0 {
        inline_coefs(i)
    } else {
        TYPE_COEFS[i % 3]
    }
}

fn build_chain(potential: &mut DihedralOplsPotential, n_dihedrals: usize) {
    for (type_id, coefs) in TYPE_COEFS.iter().enumerate() {
        potential.set_type_coefs(type_id as u32, *coefs);
    }
    for i in 0..n_dihedrals {
        let ids = [i, i + 1, i + 2, i + 3].map(|id| id as AtomId);
        if i % 5 == 0 {
            potential.create_dihedral(ids, Some(inline_coefs(i)), None);
        } else {
            potential.create_dihedral(ids, None, Some((i % 3) as u32));
        }
    }
}

// Atoms stored in reverse id order, so every lookup goes through the translation table.
fn reversed_state(device: &Device, positions_by_id: &[Vec3], with_virials: bool) -> ParticleState {
    let n = positions_by_id.len();
    let ids: Vec<AtomId> = (0..n as AtomId).rev().collect();
    let slots: Vec<Vec4> = ids
        .iter()
        .map(|&id| positions_by_id[id as usize].extend(0.0))
        .collect();
    ParticleState::new(device, &slots, &ids, Bounds::cubic(1000.0), with_virials).unwrap()
}

fn host_chain_forces(positions: &[Vec3], n_dihedrals: usize) -> Vec<Vec3> {
    let mut forces = vec![Vec3::ZERO; positions.len()];
    for i in 0..n_dihedrals {
        let quad = [positions[i], positions[i + 1], positions[i + 2], positions[i + 3]];
        let params = DihedralOplsType::new(chain_coefs(i));
        let geometry = TorsionGeometry::new(quad);
        for (k, force) in DihedralOplsEvaluator.forces(&params, &geometry).iter().enumerate() {
            forces[i + k] += *force;
        }
    }
    forces
}

fn single_dihedral(
    device: &Device,
    positions: [Vec3; 4],
    bounds: Bounds,
    with_virials: bool,
) -> (DihedralOplsPotential, ParticleState) {
    let slots: Vec<Vec4> = positions.iter().map(|p| p.extend(0.0)).collect();
    let state = ParticleState::with_sequential_ids(device, &slots, bounds, with_virials).unwrap();
    let mut potential = DihedralOplsPotential::new(device, DihedralConfig::default());
    potential.create_dihedral([0, 1, 2, 3], Some(TYPE_COEFS[0]), None);
    potential.prepare_for_run(&state).unwrap();
    (potential, state)
}

// ============================================================================
// Forces
// ============================================================================

#[test]
fn test_chain_matches_host_forces() {
    let device = Device::default();
    let n_dihedrals = 300;
    let positions = helix(n_dihedrals + 3);
    let state = reversed_state(&device, &positions, false);

    let mut potential = DihedralOplsPotential::new(&device, DihedralConfig::default());
    build_chain(&mut potential, n_dihedrals);
    potential.prepare_for_run(&state).unwrap();
    potential.compute(&state, false).unwrap();

    let expected = host_chain_forces(&positions, n_dihedrals);
    for (id, force) in expected.iter().enumerate() {
        let actual = state.force_of(id as AtomId).unwrap();
        assert_vec_approx_eq(actual, *force, 1e-4, &format!("atom {id}"));
    }
}

#[test]
fn test_shared_and_texture_parameters_agree() {
    let device = Device::default();
    let n_dihedrals = 300;
    let positions = helix(n_dihedrals + 3);

    let mut results = Vec::new();
    for policy in [SharedParamPolicy::Always, SharedParamPolicy::Never] {
        let state = reversed_state(&device, &positions, false);
        let mut potential = DihedralOplsPotential::new(
            &device,
            DihedralConfig {
                shared_params: policy,
            },
        );
        build_chain(&mut potential, n_dihedrals);
        potential.prepare_for_run(&state).unwrap();
        assert_eq!(
            potential.uses_shared_params(),
            Some(policy == SharedParamPolicy::Always)
        );
        potential.compute(&state, false).unwrap();
        results.push(state.forces());
    }

    for (slot, (shared, texture)) in results[0].iter().zip(&results[1]).enumerate() {
        assert_vec_approx_eq(*shared, *texture, 1e-5, &format!("slot {slot}"));
    }
}

#[test]
fn test_forces_accumulate_until_zeroed() {
    let device = Device::default();
    let (potential, state) = single_dihedral(&device, gauche(), Bounds::cubic(100.0), false);

    potential.compute(&state, false).unwrap();
    let once = state.forces();
    potential.compute(&state, false).unwrap();
    for (twice, once) in state.forces().iter().zip(&once) {
        assert_vec_approx_eq(*twice, 2.0 * *once, 1e-5, "second launch adds");
    }

    state.zero_forces();
    assert!(state.forces().iter().all(|f| *f == Vec3::ZERO));
}

#[test]
fn test_minimum_image_across_boundary() {
    let device = Device::default();
    let side = 10.0;
    let unwrapped = gauche();
    let mut wrapped = unwrapped;
    wrapped[3].x += side;
    wrapped[1].z -= side;

    let (potential, reference) = single_dihedral(&device, unwrapped, Bounds::cubic(side), false);
    potential.compute(&reference, false).unwrap();

    let (potential, state) = single_dihedral(&device, wrapped, Bounds::cubic(side), false);
    potential.compute(&state, false).unwrap();

    for slot in 0..4 {
        assert_vec_approx_eq(state.force(slot), reference.force(slot), 1e-4, "wrapped force");
    }
}

// ============================================================================
// Virials
// ============================================================================

#[test]
fn test_virial_goes_to_first_atom() {
    let device = Device::default();
    let positions = gauche();
    let (potential, state) = single_dihedral(&device, positions, Bounds::cubic(100.0), true);
    potential.compute(&state, true).unwrap();

    let params = DihedralOplsType::new(TYPE_COEFS[0]);
    let geometry = TorsionGeometry::new(positions);
    let expected = geometry.virial(&DihedralOplsEvaluator.forces(&params, &geometry));

    let virials = state.virials().unwrap();
    for k in 0..6 {
        assert!(
            (virials[0][k] - expected[k]).abs() < 1e-5,
            "virial component {k}: expected {}, got {}",
            expected[k],
            virials[0][k]
        );
    }
    assert!(expected.vals.iter().any(|v| v.abs() > 1e-3));
    for virial in &virials[1..] {
        assert_eq!(virial.vals, [0.0; 6]);
    }
}

#[test]
fn test_virials_need_storage() {
    let device = Device::default();
    let (potential, state) = single_dihedral(&device, gauche(), Bounds::cubic(100.0), false);
    let result = potential.compute(&state, true);
    assert!(matches!(result, Err(ForceError::VirialsUnavailable)));
    assert!(state.virials().is_none());
}

// ============================================================================
// Preparation
// ============================================================================

#[test]
fn test_parameter_table_is_dense() {
    let device = Device::default();
    let slots: Vec<Vec4> = helix(6).iter().map(|p| p.extend(0.0)).collect();
    let state = ParticleState::with_sequential_ids(&device, &slots, Bounds::cubic(100.0), false)
        .unwrap();

    let mut potential = DihedralOplsPotential::new(&device, DihedralConfig::default());
    potential.set_type_coefs(9, [9.0; 4]);
    potential.create_dihedral([0, 1, 2, 3], Some([5.0; 4]), Some(5));
    potential.create_dihedral([1, 2, 3, 4], None, Some(2));
    potential.create_dihedral([2, 3, 4, 5], Some([7.0; 4]), None);
    potential.set_type_coefs(2, [2.0; 4]);
    potential.prepare_for_run(&state).unwrap();

    let table: Vec<[f32; 4]> = potential
        .parameters()
        .unwrap()
        .to_vec()
        .iter()
        .map(|p| p.coefs)
        .collect();
    // Unused type 9 is left out; used types come first in id order.
    assert_eq!(table, vec![[2.0; 4], [5.0; 4], [7.0; 4]]);
    assert_eq!(potential.uses_shared_params(), Some(true));
}

#[test]
fn test_unknown_type_is_rejected() {
    let device = Device::default();
    let (mut potential, state) = single_dihedral(&device, gauche(), Bounds::cubic(100.0), false);
    potential.create_dihedral([3, 2, 1, 0], None, Some(7));
    let result = potential.prepare_for_run(&state);
    assert!(matches!(result, Err(ForceError::UnknownParameterType(7))));
}

#[test]
fn test_unknown_atom_is_rejected() {
    let device = Device::default();
    let (mut potential, state) = single_dihedral(&device, gauche(), Bounds::cubic(100.0), false);
    potential.create_dihedral([0, 1, 2, 99], Some(TYPE_COEFS[1]), None);
    let result = potential.prepare_for_run(&state);
    assert!(matches!(result, Err(ForceError::UnknownAtomId(99))));
}

#[test]
fn test_duplicate_atom_ids_are_rejected() {
    let device = Device::default();
    let positions: Vec<Vec4> = gauche().iter().map(|p| p.extend(0.0)).collect();
    let ids: [AtomId; 4] = [5, 2, 5, 0];
    let result = ParticleState::new(&device, &positions, &ids, Bounds::cubic(100.0), false);
    assert!(matches!(
        result,
        Err(ForceError::DuplicateAtomId(duplicate)) if duplicate.0 == 5
    ));
    assert_eq!(device.memory_info().live_allocations, 0);
}

#[test]
fn test_compute_needs_prepare() {
    let device = Device::default();
    let (mut potential, state) = single_dihedral(&device, gauche(), Bounds::cubic(100.0), false);
    assert!(potential.is_prepared());

    potential.set_type_coefs(0, TYPE_COEFS[2]);
    assert!(!potential.is_prepared());
    assert!(matches!(
        potential.compute(&state, false),
        Err(ForceError::NotPrepared)
    ));

    potential.prepare_for_run(&state).unwrap();
    potential.compute(&state, false).unwrap();
}

#[test]
#[should_panic(expected = "neither coefficients nor a type")]
fn test_dihedral_needs_coefficients() {
    let device = Device::default();
    let mut potential = DihedralOplsPotential::new(&device, DihedralConfig::default());
    potential.create_dihedral([0, 1, 2, 3], None, None);
}

// ============================================================================
// Shared memory limits
// ============================================================================

fn small_shared_device() -> Device {
    Device::new(DeviceProperties {
        shared_mem_per_block: 32,
        ..Default::default()
    })
}

#[test]
fn test_auto_falls_back_to_texture() {
    let device = small_shared_device();
    let n_dihedrals = 30;
    let positions = helix(n_dihedrals + 3);
    let state = reversed_state(&device, &positions, false);

    let mut potential = DihedralOplsPotential::new(&device, DihedralConfig::default());
    build_chain(&mut potential, n_dihedrals);
    potential.prepare_for_run(&state).unwrap();
    assert_eq!(potential.uses_shared_params(), Some(false));
    potential.compute(&state, false).unwrap();

    let expected = host_chain_forces(&positions, n_dihedrals);
    for (id, force) in expected.iter().enumerate() {
        assert_vec_approx_eq(state.force_of(id as AtomId).unwrap(), *force, 1e-4, "texture path");
    }
}

#[test]
fn test_forced_staging_past_shared_memory_fails() {
    let device = small_shared_device();
    let positions = helix(33);
    let state = reversed_state(&device, &positions, false);

    let mut potential = DihedralOplsPotential::new(
        &device,
        DihedralConfig {
            shared_params: SharedParamPolicy::Always,
        },
    );
    build_chain(&mut potential, 30);
    potential.prepare_for_run(&state).unwrap();
    let result = potential.compute(&state, false);
    assert!(matches!(
        result,
        Err(ForceError::Device(DeviceError::InvalidLaunch(_)))
    ));
}

// ============================================================================
// Kernel entry points
// ============================================================================

#[test]
fn test_kernel_reads_packed_records() {
    let device = Device::default();
    let positions = gauche();
    let slots: Vec<Vec4> = positions.iter().map(|p| p.extend(0.0)).collect();
    let state =
        ParticleState::with_sequential_ids(&device, &slots, Bounds::cubic(100.0), false).unwrap();

    let mut parameters = DeviceParameterStore::with_size(&device, 2).unwrap();
    parameters
        .write(&[
            DihedralOplsType::new([0.0; 4]),
            DihedralOplsType::new(TYPE_COEFS[1]),
        ])
        .unwrap();
    // Component 2, type 1.
    let record = DihedralRecord::from_packed([0, 1, 2, 3], (2 << 29) | 1);
    let dihedrals = GlobalArray::from_host(&device, &[record]).unwrap();

    let inputs = DihedralInputs {
        dihedrals: &dihedrals,
        parameters: &parameters,
        state: &state,
        use_shared_params: false,
        compute_virials: false,
    };
    compute_force_dihedral(&device, &inputs, &DihedralOplsEvaluator).unwrap();

    let geometry = TorsionGeometry::new(positions);
    let params = DihedralOplsType::new(TYPE_COEFS[1]);
    let expected = DihedralOplsEvaluator.forces(&params, &geometry);
    for slot in 0..4 {
        assert_vec_approx_eq(state.force(slot), expected[slot], 1e-5, "packed type");
    }

    let mut energies = vec![0.0; 4];
    let result = compute_energy_dihedral(&device, &inputs, &DihedralOplsEvaluator, &mut energies);
    assert!(matches!(result, Err(ForceError::EnergyUnimplemented(_))));
}

#[test]
fn test_single_point_energy_is_unimplemented() {
    let device = Device::default();
    let (potential, state) = single_dihedral(&device, gauche(), Bounds::cubic(100.0), false);
    assert!(matches!(
        potential.single_point_energy(&state),
        Err(ForceError::EnergyUnimplemented(_))
    ));
}

#[test]
fn test_empty_list_launches_nothing() {
    let device = Device::default();
    let slots: Vec<Vec4> = gauche().iter().map(|p| p.extend(0.0)).collect();
    let state =
        ParticleState::with_sequential_ids(&device, &slots, Bounds::cubic(100.0), false).unwrap();
    let mut potential = DihedralOplsPotential::new(&device, DihedralConfig::default());
    potential.prepare_for_run(&state).unwrap();
    potential.compute(&state, false).unwrap();
    assert_eq!(potential.parameters().map(|p| p.size()), Some(0));
    assert!(state.forces().iter().all(|f| *f == Vec3::ZERO));
}
