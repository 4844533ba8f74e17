use nalgebra::Point3;

/// The user-level definition of an RMSD restraint: a reference structure and
/// the subset of particles the RMSD is computed over.
///
/// This is plain parameter data, mirroring how a host engine describes a force
/// before it is bound to a system. Nothing is validated or centered here;
/// validation happens when an [`RmsdEvaluator`](crate::engine::evaluator::RmsdEvaluator)
/// is built from the definition or told to re-read it.
///
/// An empty particle list means "restrain every particle of the reference".
#[derive(Debug, Clone, PartialEq)]
pub struct RmsdForce {
    reference_positions: Vec<Point3<f64>>,
    particles: Vec<usize>,
}

impl RmsdForce {
    /// Creates a restraint definition.
    ///
    /// # Arguments
    ///
    /// * `reference_positions` - One coordinate per particle in the full
    ///   system, uncentered.
    /// * `particles` - Indices of the particles the RMSD is computed over;
    ///   empty means all.
    pub fn new(reference_positions: Vec<Point3<f64>>, particles: Vec<usize>) -> Self {
        Self {
            reference_positions,
            particles,
        }
    }

    /// The uncentered full-system reference positions.
    pub fn reference_positions(&self) -> &[Point3<f64>] {
        &self.reference_positions
    }

    /// The particle selection; empty means all.
    pub fn particles(&self) -> &[usize] {
        &self.particles
    }

    /// Replaces the reference structure.
    ///
    /// Takes effect on a bound evaluator only after
    /// [`update_parameters`](crate::engine::evaluator::RmsdEvaluator::update_parameters).
    pub fn set_reference_positions(&mut self, positions: Vec<Point3<f64>>) {
        self.reference_positions = positions;
    }

    /// Replaces the particle selection; empty means all.
    ///
    /// Takes effect on a bound evaluator only after
    /// [`update_parameters`](crate::engine::evaluator::RmsdEvaluator::update_parameters).
    pub fn set_particles(&mut self, particles: Vec<usize>) {
        self.particles = particles;
    }
}
