//! Flat 4x4 matrix utilities
//!
//! Matrices are stored as 16 floats in the layout GL-style uniform uploads
//! expect: elements `0..4` are the first column, `12..15` hold the
//! translation, and `m[11] = -1` is the perspective divide term of a
//! projection. The same array can be written to a uniform buffer unchanged.
//!
//! Rotations are pure: they take a matrix by value and return the rotated
//! copy, so every output element is computed from the untouched input.

/// 4x4 matrix type (column-major, flat)
pub type Mat4 = [f32; 16];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// Create a perspective projection matrix.
///
/// # Arguments
/// * `fov_y_degrees` - Vertical field of view in degrees, in `(0, 180)`
/// * `aspect` - Canvas width divided by height
/// * `z_near`, `z_far` - Clip plane distances, `0 < z_near < z_far`
///
/// # Example
/// ```
/// use duoframe_math::mat4::projection;
/// let p = projection(40.0, 1.0, 1.0, 100.0);
/// assert_eq!(p[11], -1.0);
/// ```
pub fn projection(fov_y_degrees: f32, aspect: f32, z_near: f32, z_far: f32) -> Mat4 {
    let f = 1.0 / (fov_y_degrees.to_radians() * 0.5).tan();
    let depth = z_far - z_near;

    [
        f / aspect, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, -(z_far + z_near) / depth, -1.0,
        0.0, 0.0, -2.0 * z_far * z_near / depth, 0.0,
    ]
}

/// Move a view matrix along the camera's forward axis.
///
/// Negative offsets pull the camera back from the origin.
pub fn zoom(m: Mat4, offset: f32) -> Mat4 {
    let mut out = m;
    out[14] += offset;
    out
}

/// Rotate a matrix about the X axis.
pub fn rotate_x(m: Mat4, angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    let mut out = m;

    out[1] = c * m[1] - s * m[2];
    out[5] = c * m[5] - s * m[6];
    out[9] = c * m[9] - s * m[10];

    out[2] = c * m[2] + s * m[1];
    out[6] = c * m[6] + s * m[5];
    out[10] = c * m[10] + s * m[9];

    out
}

/// Rotate a matrix about the Y axis.
pub fn rotate_y(m: Mat4, angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    let mut out = m;

    out[0] = c * m[0] + s * m[2];
    out[4] = c * m[4] + s * m[6];
    out[8] = c * m[8] + s * m[10];

    out[2] = c * m[2] - s * m[0];
    out[6] = c * m[6] - s * m[4];
    out[10] = c * m[10] - s * m[8];

    out
}

/// Rotate a matrix about the Z axis.
pub fn rotate_z(m: Mat4, angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    let mut out = m;

    out[0] = c * m[0] - s * m[1];
    out[4] = c * m[4] - s * m[5];
    out[8] = c * m[8] - s * m[9];

    out[1] = c * m[1] + s * m[0];
    out[5] = c * m[5] + s * m[4];
    out[9] = c * m[9] + s * m[8];

    out
}

/// Apply one frame of rotation: Z, then Y, then X, all by `angle`.
///
/// The order matters; the three rotations do not commute.
pub fn rotate_zyx(m: Mat4, angle: f32) -> Mat4 {
    rotate_x(rotate_y(rotate_z(m, angle), angle), angle)
}

/// Multiply two 4x4 matrices: result = a * b
///
/// Applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [0.0f32; 16];

    for col in 0..4 {
        for row in 0..4 {
            for k in 0..4 {
                result[col * 4 + row] += a[k * 4 + row] * b[col * 4 + k];
            }
        }
    }

    result
}

/// Transform a homogeneous point by a matrix: result = M * v
pub fn transform(m: Mat4, v: [f32; 4]) -> [f32; 4] {
    [
        m[0] * v[0] + m[4] * v[1] + m[8] * v[2] + m[12] * v[3],
        m[1] * v[0] + m[5] * v[1] + m[9] * v[2] + m[13] * v[3],
        m[2] * v[0] + m[6] * v[1] + m[10] * v[2] + m[14] * v[3],
        m[3] * v[0] + m[7] * v[1] + m[11] * v[2] + m[15] * v[3],
    ]
}

/// Transpose a matrix
pub fn transpose(m: Mat4) -> Mat4 {
    [
        m[0], m[4], m[8], m[12],
        m[1], m[5], m[9], m[13],
        m[2], m[6], m[10], m[14],
        m[3], m[7], m[11], m[15],
    ]
}
