//! End-to-end diffusion scenarios

use compute::{diffuse, update::Evolving, Error, Operator};
use data::{
    field::{ScalarField, TensorField},
    parameters::{ParameterError, Parameters},
    pattern,
    tensor::SymmetricTensor,
    Precision,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sum(field: &ScalarField<2>) -> Precision {
    field.as_slice().iter().sum()
}

#[test]
fn constant_field_is_a_fixed_point() {
    init_logger();
    let shape = [17, 23];
    let field = ScalarField::from_elem(shape, [1.0; 2], 5.0).unwrap();
    let tensors = TensorField::from_elem(shape, [1.0; 2], SymmetricTensor::identity()).unwrap();
    for diffusion_time in [0.1, 1.0, 10.0] {
        let params = Parameters::new(diffusion_time, 0.7, usize::MAX).unwrap();
        let diffused = diffuse(field.clone(), &tensors, &params).unwrap();
        assert_eq!(diffused.effective_diffusion_time, diffusion_time);
        assert!(diffused
            .field
            .as_slice()
            .iter()
            .all(|&value| (value - 5.0).abs() < 1e-12));
    }
}

#[test]
fn constant_field_is_a_fixed_point_in_3d() {
    init_logger();
    let shape = [6, 5, 7];
    let field = ScalarField::from_elem(shape, [1.0, 0.5, 2.0], 5.0).unwrap();
    let tensors = pattern::swirl(shape, [1.0, 0.5, 2.0], 10.0).unwrap();
    let diffused = diffuse(field, &tensors, &Parameters::default()).unwrap();
    assert!(diffused
        .field
        .as_slice()
        .iter()
        .all(|&value| (value - 5.0).abs() < 1e-12));
}

#[test]
fn hot_point_at_max_stable_step() {
    init_logger();
    let shape = [7, 7];
    let tensors = TensorField::from_elem(shape, [1.0; 2], SymmetricTensor::identity()).unwrap();
    let operator = Operator::new(&tensors);
    let time_step = operator.max_stable_time_step();
    assert_eq!(time_step, 0.25);

    let mut field = ScalarField::from_elem(shape, [1.0; 2], 0.0).unwrap();
    *field.get_mut([3, 3]) = 1.0;
    let mut fields = Evolving::new(field);
    operator.step(time_step, &mut fields);
    fields.flip();

    let next = fields.input();
    assert!(*next.get([3, 3]) < 1.0);
    for neighbor in [[2, 3], [4, 3], [3, 2], [3, 4]] {
        // Each axis neighbor is reached by two stencil edges of weight 1/2
        assert_eq!(*next.get(neighbor), time_step * 2.0 * 0.5);
    }
    assert_eq!(sum(next), 1.0);
}

#[test]
fn swirl_preserves_bounds_and_mass() {
    init_logger();
    let shape = [32, 48];
    let spacing = [1.0, 0.75];
    let field = pattern::hot_block(shape, spacing).unwrap();
    let tensors = pattern::swirl(shape, spacing, 20.0).unwrap();
    let initial_mass = sum(&field);

    let params = Parameters::new(5.0, 1.0, usize::MAX).unwrap();
    let diffused = diffuse(field, &tensors, &params).unwrap();
    assert!(diffused.effective_number_of_time_steps > 1);
    assert!(diffused
        .field
        .as_slice()
        .iter()
        .all(|&value| (-1e-12..=1.0 + 1e-12).contains(&value)));
    assert!((sum(&diffused.field) - initial_mass).abs() <= 1e-9 * initial_mass);
}

#[test]
fn operator_is_reusable() {
    init_logger();
    let shape = [9, 11];
    let tensors = pattern::swirl(shape, [1.0; 2], 3.0).unwrap();
    let field = pattern::hot_block(shape, [1.0; 2]).unwrap();
    let params = Parameters::default();

    let operator = Operator::new(&tensors);
    let first = operator.run(field.clone(), &params).unwrap();
    let mut steps = 0;
    let second = operator
        .run_with_progress(field.clone(), &params, || steps += 1)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(steps, second.effective_number_of_time_steps);
    assert_eq!(first, diffuse(field, &tensors, &params).unwrap());
}

#[test]
fn step_budget_truncates_diffusion_time() {
    init_logger();
    let shape = [8, 8];
    let field = pattern::hot_block(shape, [1.0; 2]).unwrap();
    let tensors = TensorField::from_elem(shape, [1.0; 2], SymmetricTensor::identity()).unwrap();
    let params = Parameters::new(100.0, 0.5, 10).unwrap();
    let diffused = diffuse(field, &tensors, &params).unwrap();
    assert_eq!(diffused.effective_number_of_time_steps, 10);
    assert_eq!(diffused.effective_diffusion_time, 10.0 * 0.5 * 0.25);
}

#[test]
fn zero_tensors_leave_field_unchanged() {
    init_logger();
    let shape = [4, 6];
    let field = pattern::hot_block(shape, [1.0; 2]).unwrap();
    let tensors = TensorField::from_elem(shape, [1.0; 2], SymmetricTensor::zero()).unwrap();
    let diffused = diffuse(field.clone(), &tensors, &Parameters::default()).unwrap();
    assert_eq!(diffused.field, field);
    assert_eq!(diffused.effective_number_of_time_steps, 0);
    assert_eq!(diffused.effective_diffusion_time, 1.0);
}

#[test]
fn zero_diffusion_time_is_rejected() {
    let mut params = Parameters::default();
    assert_eq!(
        params.set_diffusion_time(0.0),
        Err(ParameterError::DiffusionTime(0.0))
    );
    assert_eq!(params.diffusion_time(), 1.0);
}

#[test]
fn mismatched_grids_are_rejected() {
    let field = ScalarField::from_elem([4, 5], [1.0; 2], 0.0).unwrap();
    let tensors = TensorField::from_elem([5, 4], [1.0; 2], SymmetricTensor::identity()).unwrap();
    let params = Parameters::default();
    assert!(matches!(
        diffuse(field.clone(), &tensors, &params),
        Err(Error::GridMismatch { .. })
    ));

    let tensors = TensorField::from_elem([4, 5], [1.0, 2.0], SymmetricTensor::identity()).unwrap();
    match Operator::new(&tensors).run(field, &params) {
        Err(Error::GridMismatch {
            field_spacing,
            operator_spacing,
            ..
        }) => {
            assert_eq!(field_spacing, vec![1.0, 1.0]);
            assert_eq!(operator_spacing, vec![1.0, 2.0]);
        }
        Ok(_) => panic!("Spacing mismatch should be detected"),
    }
}
