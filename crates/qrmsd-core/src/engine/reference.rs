use super::error::ConfigurationError;
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;

/// A validated snapshot of a restraint definition, bound to a system size.
///
/// Holds the full-system reference coordinates with the *selected* entries
/// translated so their centroid is the origin; unselected entries are retained
/// verbatim and never read during evaluation. Instances are immutable: a
/// reconfiguration builds a fresh snapshot and swaps it in wholesale, so a
/// failed rebuild leaves the previous state untouched.
#[derive(Debug, Clone)]
pub struct ReferenceConfiguration {
    positions: Vec<Point3<f64>>,
    selection: Vec<usize>,
}

impl ReferenceConfiguration {
    /// Validates `selection` against `system_size` and stores `reference` with
    /// the selected entries centered on their own centroid.
    ///
    /// An empty selection defaults to every particle of the reference, in
    /// index order.
    pub fn build(
        reference: &[Point3<f64>],
        selection: &[usize],
        system_size: usize,
    ) -> Result<Self, ConfigurationError> {
        if reference.len() != system_size {
            return Err(ConfigurationError::SizeMismatch {
                expected: system_size,
                actual: reference.len(),
            });
        }

        let selection: Vec<usize> = if selection.is_empty() {
            (0..reference.len()).collect()
        } else {
            let mut seen = HashSet::with_capacity(selection.len());
            for &index in selection {
                if index >= system_size {
                    return Err(ConfigurationError::InvalidIndex { index, system_size });
                }
                if !seen.insert(index) {
                    return Err(ConfigurationError::DuplicateIndex { index });
                }
            }
            selection.to_vec()
        };

        let mut positions = reference.to_vec();
        let mut centroid = Vector3::zeros();
        for &i in &selection {
            centroid += positions[i].coords;
        }
        centroid /= selection.len() as f64;
        for &i in &selection {
            positions[i] -= centroid;
        }

        Ok(Self {
            positions,
            selection,
        })
    }

    /// The full-system reference coordinates, centered at the selected entries.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// The validated particle selection, in the order it was given.
    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    /// The particle count of the system this snapshot was validated against.
    pub fn system_size(&self) -> usize {
        self.positions.len()
    }
}
