use molforce::{
    evaluators::SwitchedExp,
    geometry::{contact::*, TrimerDistances},
    Bounds, E3bEvaluator, E3bParams, ThreeBodyEvaluator, Vec3,
};

// ============================================================================
// Helpers
// ============================================================================

fn assert_approx_eq(actual: f32, expected: f32, tol: f32, msg: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff < tol,
        "{msg}: expected {expected}, got {actual} (diff={diff}, tol={tol})"
    );
}

fn assert_vec_approx_eq(actual: Vec3, expected: Vec3, tol: f32, msg: &str) {
    let diff = (actual - expected).length();
    assert!(
        diff < tol,
        "{msg}: expected {expected}, got {actual} (diff={diff}, tol={tol})"
    );
}

fn water(oxygen: Vec3, t: f32) -> [Vec3; 3] {
    let (s, c) = t.sin_cos();
    [
        oxygen,
        oxygen + Vec3::new(0.96 * c, 0.96 * s, 0.1),
        oxygen + Vec3::new(-0.3 * c + 0.2, 0.27 * s - 0.5, 0.7),
    ]
}

fn trimer_molecules() -> [[Vec3; 3]; 3] {
    [
        water(Vec3::new(0.0, 0.0, 0.0), 0.3),
        water(Vec3::new(2.9, 0.2, 0.1), 1.9),
        water(Vec3::new(1.2, 2.7, -0.4), 4.0),
    ]
}

// Every contact out of range; tests then bring single contacts in.
fn far_trimer() -> TrimerDistances {
    let mut trimer = TrimerDistances::default();
    for contact in 0..12 {
        trimer.set(contact, Vec3::new(6.0, 0.0, 0.0));
    }
    trimer
}

fn pair_scalars(eval: &E3bEvaluator, trimer: &TrimerDistances) -> [SwitchedExp; 4] {
    std::array::from_fn(|h| eval.three_body_force_scalar(trimer.magnitudes[h]))
}

fn base_forces(eval: &E3bEvaluator, trimer: &TrimerDistances) -> [Vec3; 3] {
    let mut forces = [Vec3::ZERO; 3];
    eval.three_body_force(&mut forces, &pair_scalars(eval, trimer), trimer);
    forces
}

fn exp3(r: f32) -> f32 {
    (-E3bParams::E3B3.k3 * r).exp()
}

// ============================================================================
// Switched exponential
// ============================================================================

#[test]
fn test_switch_is_continuous() {
    let eval = E3bEvaluator::default();
    let E3bParams { rs, rc3, .. } = *eval.params();

    let inner = eval.three_body_force_scalar(rs - 1e-4);
    let at_rs = eval.three_body_force_scalar(rs);
    assert_approx_eq(at_rs.value / exp3(rs), 1.0, 1e-4, "switch is one at rs");
    assert_approx_eq(inner.value / at_rs.value, 1.0, 1e-3, "continuous at rs");

    assert_eq!(eval.three_body_force_scalar(rc3), SwitchedExp::ZERO);
    assert_eq!(eval.three_body_force_scalar(7.0), SwitchedExp::ZERO);
    let near_cutoff = eval.three_body_force_scalar(rc3 - 1e-3);
    assert!(near_cutoff.value > 0.0 && near_cutoff.value < 1e-8);
}

#[test]
fn test_switch_derivative() {
    let eval = E3bEvaluator::default();
    let h = 1e-3;
    for r in [2.0f32, 3.5, 5.05, 5.1, 5.15] {
        let fd = (eval.three_body_force_scalar(r + h).value
            - eval.three_body_force_scalar(r - h).value)
            / (2.0 * h);
        let analytic = eval.three_body_force_scalar(r).derivative;
        assert!(analytic < 0.0, "decreasing at {r}");
        assert_approx_eq(fd / analytic, 1.0, 1e-2, &format!("df/dr at {r}"));
    }
}

#[test]
fn test_count_within_cutoff() {
    let eval = E3bEvaluator::default();
    assert_eq!(eval.count_within_cutoff([1.0, 5.19, 5.2, 9.0]), 2);
    assert_eq!(eval.count_within_cutoff([6.0; 4]), 0);
    assert_eq!(eval.count_within_cutoff([2.0; 4]), 4);
}

// ============================================================================
// Two-body term
// ============================================================================

#[test]
fn test_two_body_force_is_negative_gradient() {
    let eval = E3bEvaluator::default();
    let a1 = Vec3::new(0.3, -0.2, 0.1);
    let a2 = Vec3::new(2.9, 0.4, 0.6);
    let h = 1e-3;

    let r = a1 - a2;
    let force = eval.two_body_force(r, r.length());
    let mut gradient = Vec3::ZERO;
    for axis in 0..3 {
        let mut plus = a1;
        plus[axis] += h;
        let mut minus = a1;
        minus[axis] -= h;
        gradient[axis] = (eval.two_body_energy((plus - a2).length())
            - eval.two_body_energy((minus - a2).length()))
            / (2.0 * h);
    }
    assert_vec_approx_eq(force, -gradient, 2e-3, "two-body force");
    assert!(force.dot(r) > 0.0, "repulsive");
}

#[test]
fn test_two_body_cutoff() {
    let eval = E3bEvaluator::default();
    let r = Vec3::new(5.3, 0.0, 0.0);
    assert_eq!(eval.two_body_energy(r.length()), 0.0);
    assert_eq!(eval.two_body_force(r, r.length()), Vec3::ZERO);
}

// ============================================================================
// Contact pairs
// ============================================================================

#[test]
fn test_single_contact_contributes_nothing() {
    let eval = E3bEvaluator::default();
    let mut trimer = far_trimer();
    trimer.set(B2A1, Vec3::new(2.0, 0.0, 0.0));

    assert_eq!(eval.trimer_energy(&trimer), 0.0);
    assert_eq!(base_forces(&eval, &trimer), [Vec3::ZERO; 3]);
}

#[test]
fn test_pair_within_two_molecules_contributes_nothing() {
    let eval = E3bEvaluator::default();
    let mut trimer = far_trimer();
    trimer.set(B2A1, Vec3::new(2.0, 0.0, 0.0));
    trimer.set(C2A1, Vec3::new(0.0, 2.5, 0.0));

    assert_eq!(eval.trimer_energy(&trimer), 0.0);
    assert_eq!(base_forces(&eval, &trimer), [Vec3::ZERO; 3]);
}

#[test]
fn test_pair_types() {
    let eval = E3bEvaluator::default();
    let params = *eval.params();
    let expected_product = exp3(2.0) * exp3(2.5);

    // Both hydrogens of molecule 2 donated: type A.
    // Both accepted by the oxygen of molecule 1: type C.
    // Molecule 2 donates to 1, molecule 1 donates to 3: type B.
    for (second, prefactor, name) in [
        (B2A3, params.ea, "double donor"),
        (B3A1, params.ec, "double acceptor"),
        (B1A3, params.eb, "chain"),
    ] {
        let mut trimer = far_trimer();
        trimer.set(B2A1, Vec3::new(2.0, 0.0, 0.0));
        trimer.set(second, Vec3::new(0.0, 0.0, 2.5));
        let energy = eval.trimer_energy(&trimer);
        assert_approx_eq(
            energy / (prefactor * expected_product),
            1.0,
            1e-4,
            name,
        );
    }
}

#[test]
fn test_double_acceptor_pushes_base_oxygen() {
    let eval = E3bEvaluator::default();
    let mut trimer = far_trimer();
    trimer.set(B2A1, Vec3::new(2.0, 0.0, 0.0));
    trimer.set(B3A1, Vec3::new(0.0, 2.5, 0.0));

    let forces = base_forces(&eval, &trimer);
    assert!(forces[0].length() > 0.0);
    // The base hydrogens take part in neither contact.
    assert_eq!(forces[1], Vec3::ZERO);
    assert_eq!(forces[2], Vec3::ZERO);

    // ec > 0 is repulsive: the oxygen is pushed away from both hydrogens.
    assert!(forces[0].x < 0.0 && forces[0].y < 0.0);
}

// ============================================================================
// Trimer forces
// ============================================================================

#[test]
fn test_trimer_energy_of_water() {
    let eval = E3bEvaluator::default();
    let trimer = TrimerDistances::from_molecules(&trimer_molecules(), &Bounds::cubic(50.0));
    assert_approx_eq(eval.trimer_energy(&trimer), -0.278024, 1e-4, "trimer energy");
}

#[test]
fn test_trimer_forces_are_negative_gradient() {
    let eval = E3bEvaluator::default();
    let bounds = Bounds::cubic(50.0);
    let molecules = trimer_molecules();
    let forces = base_forces(&eval, &TrimerDistances::from_molecules(&molecules, &bounds));
    let h = 1e-3;

    for atom in 0..3 {
        let mut gradient = Vec3::ZERO;
        for axis in 0..3 {
            let mut plus = molecules;
            plus[0][atom][axis] += h;
            let mut minus = molecules;
            minus[0][atom][axis] -= h;
            gradient[axis] = (eval
                .trimer_energy(&TrimerDistances::from_molecules(&plus, &bounds))
                - eval.trimer_energy(&TrimerDistances::from_molecules(&minus, &bounds)))
                / (2.0 * h);
        }
        assert_vec_approx_eq(forces[atom], -gradient, 2e-3, &format!("base atom {atom}"));
    }
    assert!(forces[0].length() > 1e-2);
}

#[test]
fn test_trimer_energy_ignores_molecule_order() {
    let eval = E3bEvaluator::default();
    let bounds = Bounds::cubic(50.0);
    let [m1, m2, m3] = trimer_molecules();
    let reference = eval.trimer_energy(&TrimerDistances::from_molecules(&[m1, m2, m3], &bounds));
    for order in [[m2, m1, m3], [m3, m2, m1], [m2, m3, m1]] {
        let energy = eval.trimer_energy(&TrimerDistances::from_molecules(&order, &bounds));
        assert_approx_eq(energy, reference, 1e-5, "permuted trimer");
    }
}
