use nalgebra::{Matrix4, Vector4};
use std::cmp::Ordering;

const MAX_SWEEPS: usize = 64;

/// Eigendecomposition of a 4x4 real symmetric matrix.
///
/// Computed with cyclic Jacobi rotations on fixed-size storage, so the whole
/// decomposition is allocation-free and deterministic. Eigenvalues are sorted
/// in ascending order; `vectors` holds the matching unit eigenvectors as
/// columns. For repeated eigenvalues the returned eigenvectors are an
/// arbitrary but deterministic orthonormal basis of the eigenspace.
#[derive(Debug, Clone)]
pub struct SymmetricEigen4 {
    pub values: Vector4<f64>,
    pub vectors: Matrix4<f64>,
}

impl SymmetricEigen4 {
    /// Decomposes `matrix`, which must be symmetric (only the given entries
    /// are trusted; no symmetrization is performed).
    pub fn new(matrix: Matrix4<f64>) -> Self {
        let mut a = matrix;
        let mut v = Matrix4::identity();

        for _ in 0..MAX_SWEEPS {
            if off_diagonal_norm_squared(&a) <= convergence_threshold(&a) {
                break;
            }
            for p in 0..3 {
                for q in (p + 1)..4 {
                    rotate(&mut a, &mut v, p, q);
                }
            }
        }

        let mut order = [0usize, 1, 2, 3];
        order.sort_unstable_by(|&i, &j| {
            a[(i, i)]
                .partial_cmp(&a[(j, j)])
                .unwrap_or(Ordering::Equal)
        });

        let mut values = Vector4::zeros();
        let mut vectors = Matrix4::zeros();
        for (dst, &src) in order.iter().enumerate() {
            values[dst] = a[(src, src)];
            vectors.set_column(dst, &v.column(src));
        }

        Self { values, vectors }
    }

    /// The eigenpair with the largest eigenvalue.
    pub fn largest(&self) -> (f64, Vector4<f64>) {
        (self.values[3], self.vectors.column(3).into_owned())
    }
}

fn off_diagonal_norm_squared(a: &Matrix4<f64>) -> f64 {
    let mut off = 0.0;
    for p in 0..3 {
        for q in (p + 1)..4 {
            off += a[(p, q)] * a[(p, q)];
        }
    }
    off
}

fn convergence_threshold(a: &Matrix4<f64>) -> f64 {
    let diag = a.diagonal().norm_squared().max(f64::MIN_POSITIVE);
    f64::EPSILON * f64::EPSILON * diag
}

/// One Jacobi rotation in the (p, q) plane, annihilating `a[(p, q)]` while
/// accumulating the rotation into the eigenvector matrix `v`.
fn rotate(a: &mut Matrix4<f64>, v: &mut Matrix4<f64>, p: usize, q: usize) {
    let apq = a[(p, q)];
    if apq == 0.0 {
        return;
    }

    // Stable smaller root of t^2 + 2*theta*t - 1 = 0.
    let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
    let t = if theta >= 0.0 {
        1.0 / (theta + (1.0 + theta * theta).sqrt())
    } else {
        -1.0 / (-theta + (1.0 + theta * theta).sqrt())
    };
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = t * c;

    let app = a[(p, p)];
    let aqq = a[(q, q)];
    a[(p, p)] = app - t * apq;
    a[(q, q)] = aqq + t * apq;
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;

    for r in 0..4 {
        if r == p || r == q {
            continue;
        }
        let arp = a[(r, p)];
        let arq = a[(r, q)];
        a[(r, p)] = c * arp - s * arq;
        a[(p, r)] = a[(r, p)];
        a[(r, q)] = s * arp + c * arq;
        a[(q, r)] = a[(r, q)];
    }

    for r in 0..4 {
        let vrp = v[(r, p)];
        let vrq = v[(r, q)];
        v[(r, p)] = c * vrp - s * vrq;
        v[(r, q)] = s * vrp + c * vrq;
    }
}
