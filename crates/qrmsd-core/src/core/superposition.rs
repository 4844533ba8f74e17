use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// Computes the 3x3 cross-correlation matrix between two centered coordinate
/// sets of equal length: `R[i][j] = sum_k current[k][i] * reference[k][j]`.
///
/// Both sets must already be centered on their own centroids; this function
/// does not center them.
pub fn correlation_matrix(current: &[Vector3<f64>], reference: &[Vector3<f64>]) -> Matrix3<f64> {
    debug_assert_eq!(current.len(), reference.len());
    let mut r = Matrix3::zeros();
    for (c, p) in current.iter().zip(reference.iter()) {
        r += c * p.transpose();
    }
    r
}

/// Builds the 4x4 symmetric quaternion matrix of Coutsias et al. from the
/// correlation matrix. Its largest eigenvalue maximizes the correlation over
/// all proper rotations, and the corresponding unit eigenvector is the optimal
/// rotation quaternion. The matrix is traceless by construction.
pub fn quaternion_matrix(r: &Matrix3<f64>) -> Matrix4<f64> {
    Matrix4::new(
        r[(0, 0)] + r[(1, 1)] + r[(2, 2)],
        r[(1, 2)] - r[(2, 1)],
        r[(2, 0)] - r[(0, 2)],
        r[(0, 1)] - r[(1, 0)],
        //
        r[(1, 2)] - r[(2, 1)],
        r[(0, 0)] - r[(1, 1)] - r[(2, 2)],
        r[(0, 1)] + r[(1, 0)],
        r[(0, 2)] + r[(2, 0)],
        //
        r[(2, 0)] - r[(0, 2)],
        r[(0, 1)] + r[(1, 0)],
        -r[(0, 0)] + r[(1, 1)] - r[(2, 2)],
        r[(1, 2)] + r[(2, 1)],
        //
        r[(0, 1)] - r[(1, 0)],
        r[(0, 2)] + r[(2, 0)],
        r[(1, 2)] + r[(2, 1)],
        -r[(0, 0)] - r[(1, 1)] + r[(2, 2)],
    )
}

/// Converts a unit quaternion `(q0, q1, q2, q3)` to a rotation matrix via the
/// standard quadratic formula. `q` and `-q` produce the same matrix.
pub fn rotation_from_quaternion(q: &Vector4<f64>) -> Matrix3<f64> {
    let q00 = q[0] * q[0];
    let q01 = q[0] * q[1];
    let q02 = q[0] * q[2];
    let q03 = q[0] * q[3];
    let q11 = q[1] * q[1];
    let q12 = q[1] * q[2];
    let q13 = q[1] * q[3];
    let q22 = q[2] * q[2];
    let q23 = q[2] * q[3];
    let q33 = q[3] * q[3];

    Matrix3::new(
        q00 + q11 - q22 - q33,
        2.0 * (q12 - q03),
        2.0 * (q13 + q02),
        //
        2.0 * (q12 + q03),
        q00 - q11 + q22 - q33,
        2.0 * (q23 - q01),
        //
        2.0 * (q13 - q02),
        2.0 * (q23 + q01),
        q00 - q11 - q22 + q33,
    )
}
