//! Projection, view and model matrices for the manual pass
//!
//! [`TransformPipeline`] owns the three live matrices. The projection only
//! changes when the canvas aspect changes, the view only changes on zoom,
//! and the model matrix accumulates one Z/Y/X rotation step per frame.

use serde::{Deserialize, Serialize};

use crate::mat4::{self, Mat4, IDENTITY};

/// Perspective parameters that stay fixed across resizes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Near clipping plane
    pub z_near: f32,
    /// Far clipping plane
    pub z_far: f32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            fov_y_degrees: 40.0,
            z_near: 1.0,
            z_far: 100.0,
        }
    }
}

impl ProjectionParams {
    /// Check that the parameters describe a usable frustum
    pub fn is_valid(&self) -> bool {
        self.fov_y_degrees > 0.0
            && self.fov_y_degrees < 180.0
            && self.z_near > 0.0
            && self.z_near < self.z_far
            && self.z_far.is_finite()
    }

    /// Build the projection matrix for a given aspect ratio
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        mat4::projection(self.fov_y_degrees, aspect, self.z_near, self.z_far)
    }
}

/// The model/view/projection matrices used by the manual pass
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    params: ProjectionParams,
    aspect: f32,
    projection: Mat4,
    view: Mat4,
    model: Mat4,
}

impl TransformPipeline {
    /// Create a pipeline with the camera pulled back by `zoom` along its
    /// forward axis (negative values move away from the origin).
    pub fn new(params: ProjectionParams, aspect: f32, zoom: f32) -> Self {
        let aspect = if is_usable_aspect(aspect) { aspect } else { 1.0 };

        Self {
            params,
            aspect,
            projection: params.matrix(aspect),
            view: mat4::zoom(IDENTITY, zoom),
            model: IDENTITY,
        }
    }

    /// Recompute the projection for a new canvas aspect ratio.
    ///
    /// Degenerate ratios (zero-height canvas, NaN) are rejected and the
    /// previous projection is kept. Returns whether the projection changed.
    pub fn set_aspect(&mut self, aspect: f32) -> bool {
        if !is_usable_aspect(aspect) {
            return false;
        }
        self.aspect = aspect;
        self.projection = self.params.matrix(aspect);
        true
    }

    /// Recompute the projection from canvas dimensions in pixels.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.set_aspect(width as f32 / height as f32)
    }

    /// Move the camera along its forward axis
    pub fn zoom(&mut self, offset: f32) {
        self.view = mat4::zoom(self.view, offset);
    }

    /// Accumulate one frame of rotation into the model matrix.
    ///
    /// The rotation compounds onto whatever the model already holds.
    pub fn rotate(&mut self, angle: f32) {
        self.model = mat4::rotate_zyx(self.model, angle);
    }

    /// Current aspect ratio
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Projection parameters
    pub fn params(&self) -> ProjectionParams {
        self.params
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// View matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Model matrix
    pub fn model(&self) -> &Mat4 {
        &self.model
    }
}

fn is_usable_aspect(aspect: f32) -> bool {
    aspect.is_finite() && aspect > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat_approx_eq(a: &Mat4, b: &Mat4) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_default_params_valid() {
        assert!(ProjectionParams::default().is_valid());
    }

    #[test]
    fn test_invalid_params() {
        let mut p = ProjectionParams::default();
        p.z_near = 200.0;
        assert!(!p.is_valid());

        let mut p = ProjectionParams::default();
        p.fov_y_degrees = 180.0;
        assert!(!p.is_valid());

        let mut p = ProjectionParams::default();
        p.z_near = 0.0;
        assert!(!p.is_valid());
    }

    #[test]
    fn test_new_pipeline() {
        let t = TransformPipeline::new(ProjectionParams::default(), 2.0, -6.0);
        assert_eq!(t.aspect(), 2.0);
        assert_eq!(t.view()[14], -6.0);
        assert_eq!(*t.model(), IDENTITY);
        assert_eq!(*t.projection(), ProjectionParams::default().matrix(2.0));
    }

    #[test]
    fn test_new_with_bad_aspect_falls_back() {
        let t = TransformPipeline::new(ProjectionParams::default(), f32::NAN, -6.0);
        assert_eq!(t.aspect(), 1.0);
    }

    #[test]
    fn test_set_canvas_size_recomputes_projection() {
        let mut t = TransformPipeline::new(ProjectionParams::default(), 1.0, -6.0);
        assert!(t.set_canvas_size(800, 400));
        assert_eq!(t.aspect(), 2.0);
        assert_eq!(*t.projection(), ProjectionParams::default().matrix(2.0));
    }

    #[test]
    fn test_zero_height_keeps_projection() {
        let mut t = TransformPipeline::new(ProjectionParams::default(), 1.5, -6.0);
        let before = *t.projection();
        assert!(!t.set_canvas_size(640, 0));
        assert!(!t.set_aspect(0.0));
        assert_eq!(*t.projection(), before);
        assert_eq!(t.aspect(), 1.5);
    }

    #[test]
    fn test_zoom_only_changes_view() {
        let mut t = TransformPipeline::new(ProjectionParams::default(), 1.0, -6.0);
        let projection = *t.projection();
        t.zoom(1.0);
        assert_eq!(t.view()[14], -5.0);
        assert_eq!(*t.projection(), projection);
        assert_eq!(*t.model(), IDENTITY);
    }

    #[test]
    fn test_rotation_accumulates() {
        let mut t = TransformPipeline::new(ProjectionParams::default(), 1.0, -6.0);
        t.rotate(0.01);
        t.rotate(0.02);

        let expected = mat4::rotate_zyx(mat4::rotate_zyx(IDENTITY, 0.01), 0.02);
        assert!(mat_approx_eq(t.model(), &expected));
        // The view is never touched by rotation
        assert_eq!(t.view()[14], -6.0);
    }
}
