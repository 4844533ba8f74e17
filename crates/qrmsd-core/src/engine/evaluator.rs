use super::error::ConfigurationError;
use super::force::RmsdForce;
use super::reference::ReferenceConfiguration;
use crate::core::eigen::SymmetricEigen4;
use crate::core::superposition::{
    correlation_matrix, quaternion_matrix, rotation_from_quaternion,
};
use nalgebra::{Point3, Vector3};
use tracing::{debug, instrument};

/// Below this mean-square deviation the structures are treated as coincident:
/// floating-point error would otherwise produce a negative sqrt argument or
/// divide the forces by a vanishing RMSD.
const COINCIDENT_MSD_THRESHOLD: f64 = 1e-20;

/// Per-step evaluator of the minimum RMSD between the selected particles and a
/// reference structure, with its analytic gradient as per-particle forces.
///
/// Uses the closed-form quaternion algorithm of Coutsias et al. (doi:
/// 10.1002/jcc.20110): the cross-correlation matrix between the centered
/// coordinate sets yields a 4x4 symmetric matrix whose dominant eigenvector is
/// the optimal rotation quaternion and whose dominant eigenvalue gives the
/// minimum RMSD directly.
///
/// [`evaluate`](Self::evaluate) is a pure function of the stored reference and
/// the supplied positions and takes `&self`; the reconfiguration paths take
/// `&mut self` and replace the stored state atomically.
#[derive(Debug, Clone)]
pub struct RmsdEvaluator {
    reference: ReferenceConfiguration,
}

impl RmsdEvaluator {
    /// Binds a restraint definition to a system of `system_size` particles.
    ///
    /// Validates the definition (reference length against `system_size`,
    /// selection indices in range and distinct) and stores the reference with
    /// the selected entries centered on their centroid.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the reference length does not match
    /// `system_size` or the selection contains an out-of-range or duplicated
    /// index.
    #[instrument(skip_all, name = "rmsd_configure")]
    pub fn new(force: &RmsdForce, system_size: usize) -> Result<Self, ConfigurationError> {
        let reference =
            ReferenceConfiguration::build(force.reference_positions(), force.particles(), system_size)?;
        debug!(
            system_size,
            num_selected = reference.selection().len(),
            "Configured RMSD restraint."
        );
        Ok(Self { reference })
    }

    /// Re-reads the definition after its parameters changed, keeping the bound
    /// system size.
    ///
    /// An empty selection defaults to every particle of the stored reference,
    /// in index order (the reference array's length decides, not the system).
    /// After a successful update any host state derived from this evaluator is
    /// stale and must be recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::SizeMismatch`] if the definition's
    /// reference length changed since construction, or an index error as in
    /// [`new`](Self::new). On error the previously stored state is left
    /// untouched.
    #[instrument(skip_all, name = "rmsd_update_parameters")]
    pub fn update_parameters(&mut self, force: &RmsdForce) -> Result<(), ConfigurationError> {
        let rebuilt = ReferenceConfiguration::build(
            force.reference_positions(),
            force.particles(),
            self.reference.system_size(),
        )?;
        debug!(
            num_selected = rebuilt.selection().len(),
            "Replaced RMSD restraint parameters."
        );
        self.reference = rebuilt;
        Ok(())
    }

    /// The particle count this evaluator was validated against.
    pub fn system_size(&self) -> usize {
        self.reference.system_size()
    }

    /// The active particle selection, in evaluation order.
    pub fn selection(&self) -> &[usize] {
        self.reference.selection()
    }

    /// Computes the minimum RMSD of the selected particles against the stored
    /// reference and writes the force `-dRMSD/dx_i` for each selected particle
    /// `i` into `forces[i]`.
    ///
    /// `positions` and `forces` must each hold one entry per particle in the
    /// full system. Force entries outside the selection are left exactly as
    /// supplied. Never fails and never produces NaN: when the structures are
    /// (numerically) coincident the RMSD is zero and the selected forces are
    /// written as zero, which is the correct limit.
    pub fn evaluate(&self, positions: &[Point3<f64>], forces: &mut [Vector3<f64>]) -> f64 {
        let selection = self.reference.selection();
        let n = selection.len();
        debug_assert_eq!(positions.len(), self.reference.system_size());
        debug_assert_eq!(forces.len(), positions.len());

        // Center the selected current positions; the stored reference entries
        // are centered already.
        let mut center = Vector3::zeros();
        for &i in selection {
            center += positions[i].coords;
        }
        center /= n as f64;
        let current: Vec<Vector3<f64>> = selection
            .iter()
            .map(|&i| positions[i].coords - center)
            .collect();
        let reference: Vec<Vector3<f64>> = selection
            .iter()
            .map(|&i| self.reference.positions()[i].coords)
            .collect();

        let r = correlation_matrix(&current, &reference);
        let f = quaternion_matrix(&r);
        let (lambda_max, q) = SymmetricEigen4::new(f).largest();

        let sum: f64 = current
            .iter()
            .zip(reference.iter())
            .map(|(c, p)| c.norm_squared() + p.norm_squared())
            .sum();
        let msd = (sum - 2.0 * lambda_max) / n as f64;
        if msd < COINCIDENT_MSD_THRESHOLD {
            for &i in selection {
                forces[i] = Vector3::zeros();
            }
            return 0.0;
        }
        let rmsd = msd.sqrt();

        // The dominant eigenvector rotates the current structure onto the
        // reference; its inverse (the transpose) maps the reference into the
        // current frame, where the gradient lives.
        let u = rotation_from_quaternion(&q);
        let scale = 1.0 / (rmsd * n as f64);
        for (k, &i) in selection.iter().enumerate() {
            forces[i] = -(current[k] - u.tr_mul(&reference[k])) * scale;
        }
        rmsd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Unit};

    const SENTINEL: Vector3<f64> = Vector3::new(7.0, 7.0, 7.0);

    /// A 6-particle system restraining particles [1, 2, 4, 5] to a unit-ish
    /// square in the XY plane, centered at the origin. Particles 0 and 3 are
    /// outside the selection.
    fn square_force() -> RmsdForce {
        RmsdForce::new(
            vec![
                Point3::new(50.0, 50.0, 50.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(-50.0, -50.0, -50.0),
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(-1.0, 1.0, 0.0),
            ],
            vec![1, 2, 4, 5],
        )
    }

    /// An irregular current configuration for the same system, far from the
    /// reference (rmsd well above 1e-6).
    fn irregular_positions() -> Vec<Point3<f64>> {
        vec![
            Point3::new(50.0, 50.0, 50.0),
            Point3::new(1.3, 0.8, 0.2),
            Point3::new(0.9, -1.4, -0.3),
            Point3::new(-50.0, -50.0, -50.0),
            Point3::new(-0.7, -0.9, 0.5),
            Point3::new(-1.2, 1.1, -0.1),
        ]
    }

    fn evaluate(evaluator: &RmsdEvaluator, positions: &[Point3<f64>]) -> (f64, Vec<Vector3<f64>>) {
        let mut forces = vec![SENTINEL; positions.len()];
        let rmsd = evaluator.evaluate(positions, &mut forces);
        (rmsd, forces)
    }

    #[test]
    fn self_alignment_gives_zero_rmsd_and_zero_forces() {
        let force = square_force();
        let evaluator = RmsdEvaluator::new(&force, 6).unwrap();
        let (rmsd, forces) = evaluate(&evaluator, force.reference_positions());

        assert_eq!(rmsd, 0.0);
        for &i in evaluator.selection() {
            assert_eq!(forces[i], Vector3::zeros());
        }
    }

    #[test]
    fn rotated_and_translated_square_has_zero_rmsd() {
        let force = square_force();
        let evaluator = RmsdEvaluator::new(&force, 6).unwrap();

        // Reference rotated 90 degrees about Z, then translated by (5, 5, 5).
        let mut positions = force.reference_positions().to_vec();
        for &i in evaluator.selection() {
            let p = force.reference_positions()[i];
            positions[i] = Point3::new(-p.y + 5.0, p.x + 5.0, p.z + 5.0);
        }
        let (rmsd, forces) = evaluate(&evaluator, &positions);

        assert_eq!(rmsd, 0.0);
        for &i in evaluator.selection() {
            assert_eq!(forces[i], Vector3::zeros());
        }
    }

    #[test]
    fn uniformly_scaled_square_has_known_rmsd_and_forces() {
        let force = square_force();
        let evaluator = RmsdEvaluator::new(&force, 6).unwrap();

        // Doubling the square leaves the optimal rotation at identity, so
        // every selected particle deviates by its own reference vector.
        let mut positions = force.reference_positions().to_vec();
        for &i in evaluator.selection() {
            positions[i] = Point3::from(force.reference_positions()[i].coords * 2.0);
        }
        let (rmsd, forces) = evaluate(&evaluator, &positions);

        assert_relative_eq!(rmsd, 2.0f64.sqrt(), epsilon = 1e-14);
        let expected = -Vector3::new(1.0, 1.0, 0.0) / (2.0f64.sqrt() * 4.0);
        assert_relative_eq!(forces[1], expected, epsilon = 1e-14);
    }

    #[test]
    fn rigid_motion_of_the_current_structure_leaves_rmsd_unchanged() {
        let force = square_force();
        let evaluator = RmsdEvaluator::new(&force, 6).unwrap();
        let positions = irregular_positions();
        let (rmsd, _) = evaluate(&evaluator, &positions);
        assert!(rmsd > 1e-6);

        let rotation = Rotation3::from_axis_angle(
            &Unit::new_normalize(Vector3::new(1.0, -2.0, 0.5)),
            1.234,
        );
        let translation = Vector3::new(-3.0, 8.0, 0.25);
        let mut moved = positions.clone();
        for &i in evaluator.selection() {
            moved[i] = rotation * positions[i] + translation;
        }
        let (moved_rmsd, _) = evaluate(&evaluator, &moved);

        assert_relative_eq!(moved_rmsd, rmsd, max_relative = 1e-8);
    }

    #[test]
    fn translating_the_current_structure_leaves_forces_unchanged() {
        let force = square_force();
        let evaluator = RmsdEvaluator::new(&force, 6).unwrap();
        let positions = irregular_positions();
        let (_, forces) = evaluate(&evaluator, &positions);

        let shift = Vector3::new(11.0, -4.0, 2.5);
        let mut moved = positions.clone();
        for &i in evaluator.selection() {
            moved[i] = positions[i] + shift;
        }
        let (_, moved_forces) = evaluate(&evaluator, &moved);

        for &i in evaluator.selection() {
            assert_relative_eq!(moved_forces[i], forces[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn analytic_forces_match_the_numerical_gradient() {
        let force = square_force();
        let evaluator = RmsdEvaluator::new(&force, 6).unwrap();
        let positions = irregular_positions();
        let (rmsd, forces) = evaluate(&evaluator, &positions);
        assert!(rmsd > 1e-6);

        let h = 1e-5;
        for &i in evaluator.selection() {
            for axis in 0..3 {
                let mut plus = positions.clone();
                plus[i][axis] += h;
                let mut minus = positions.clone();
                minus[i][axis] -= h;
                let (rmsd_plus, _) = evaluate(&evaluator, &plus);
                let (rmsd_minus, _) = evaluate(&evaluator, &minus);
                let gradient = (rmsd_plus - rmsd_minus) / (2.0 * h);

                assert_relative_eq!(
                    forces[i][axis],
                    -gradient,
                    epsilon = 1e-8,
                    max_relative = 1e-5
                );
            }
        }
    }

    #[test]
    fn reordering_the_selection_does_not_change_the_result() {
        let reference = square_force().reference_positions().to_vec();
        let forward = RmsdEvaluator::new(&RmsdForce::new(reference.clone(), vec![1, 2, 4, 5]), 6)
            .unwrap();
        let shuffled = RmsdEvaluator::new(&RmsdForce::new(reference, vec![5, 2, 1, 4]), 6).unwrap();
        let positions = irregular_positions();

        let (rmsd_a, forces_a) = evaluate(&forward, &positions);
        let (rmsd_b, forces_b) = evaluate(&shuffled, &positions);

        assert_relative_eq!(rmsd_a, rmsd_b, epsilon = 1e-12);
        for &i in forward.selection() {
            assert_relative_eq!(forces_a[i], forces_b[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn nearly_coincident_structures_yield_exact_zero_without_nan() {
        let force = square_force();
        let evaluator = RmsdEvaluator::new(&force, 6).unwrap();

        // Contract the square by one part in 2^40; the true mean-square
        // deviation is ~1.7e-24, below the coincidence threshold.
        let shrink = 1.0 - 2.0f64.powi(-40);
        let mut positions = force.reference_positions().to_vec();
        for &i in evaluator.selection() {
            positions[i] = Point3::from(force.reference_positions()[i].coords * shrink);
        }
        let (rmsd, forces) = evaluate(&evaluator, &positions);

        assert_eq!(rmsd, 0.0);
        for &i in evaluator.selection() {
            assert_eq!(forces[i], Vector3::zeros());
        }
    }

    #[test]
    fn force_entries_outside_the_selection_are_left_as_supplied() {
        let force = square_force();
        let evaluator = RmsdEvaluator::new(&force, 6).unwrap();
        let (rmsd, forces) = evaluate(&evaluator, &irregular_positions());

        assert!(rmsd > 0.0);
        assert_eq!(forces[0], SENTINEL);
        assert_eq!(forces[3], SENTINEL);
    }

    #[test]
    fn configuring_with_an_out_of_range_index_fails() {
        let force = RmsdForce::new(square_force().reference_positions().to_vec(), vec![0, 6]);
        let error = RmsdEvaluator::new(&force, 6).expect_err("index out of range");
        assert_eq!(
            error,
            ConfigurationError::InvalidIndex {
                index: 6,
                system_size: 6
            }
        );
    }

    #[test]
    fn configuring_with_a_duplicated_index_fails() {
        let force = RmsdForce::new(square_force().reference_positions().to_vec(), vec![2, 4, 2]);
        let error = RmsdEvaluator::new(&force, 6).expect_err("duplicate index");
        assert_eq!(error, ConfigurationError::DuplicateIndex { index: 2 });
    }

    #[test]
    fn configuring_with_a_wrong_length_reference_fails() {
        let force = square_force();
        let error = RmsdEvaluator::new(&force, 7).expect_err("size mismatch");
        assert_eq!(
            error,
            ConfigurationError::SizeMismatch {
                expected: 7,
                actual: 6
            }
        );
    }

    #[test]
    fn update_rejects_a_reference_whose_length_changed() {
        let mut force = square_force();
        let mut evaluator = RmsdEvaluator::new(&force, 6).unwrap();

        let mut grown = force.reference_positions().to_vec();
        grown.push(Point3::origin());
        force.set_reference_positions(grown);
        let error = evaluator.update_parameters(&force).expect_err("size changed");
        assert_eq!(
            error,
            ConfigurationError::SizeMismatch {
                expected: 6,
                actual: 7
            }
        );
        // The previous state survives a failed update.
        assert_eq!(evaluator.selection(), &[1, 2, 4, 5]);
    }

    #[test]
    fn update_with_an_empty_selection_restrains_every_reference_particle() {
        let mut force = square_force();
        let mut evaluator = RmsdEvaluator::new(&force, 6).unwrap();

        force.set_particles(vec![]);
        evaluator.update_parameters(&force).unwrap();
        assert_eq!(evaluator.selection(), &[0, 1, 2, 3, 4, 5]);

        let (rmsd, forces) = evaluate(&evaluator, &irregular_positions());
        assert!(rmsd > 0.0);
        // Previously unselected particles now receive forces.
        assert_ne!(forces[0], SENTINEL);
        assert_ne!(forces[3], SENTINEL);
    }

    #[test]
    fn failed_update_keeps_the_previous_selection_usable() {
        let mut force = square_force();
        let mut evaluator = RmsdEvaluator::new(&force, 6).unwrap();
        let (before, _) = evaluate(&evaluator, &irregular_positions());

        force.set_particles(vec![1, 99]);
        evaluator
            .update_parameters(&force)
            .expect_err("invalid index");

        let (after, _) = evaluate(&evaluator, &irregular_positions());
        assert_eq!(before, after);
    }
}
