//! Perspective camera shared by both pipelines.
//!
//! Every mutator rebuilds the derived transforms immediately, so the
//! getters never observe stale state.

use glam::{Mat3, Mat4, Vec3, Vec4};

/// Depth range the projection maps the view range onto.
pub const FRUSTUM_NEAR: f32 = 0.0;
pub const FRUSTUM_FAR: f32 = 1.0;

/// Camera-space depth range used for culling and the projection.
pub const VIEW_NEAR: f32 = 0.1;
pub const VIEW_FAR: f32 = 100.0;

/// Camera with position, look direction, field of view and focal length.
///
/// Camera space is left-handed: +x right, +y up, +z along the look
/// direction. The camera-to-world transform carries the field-of-view
/// scale on x/y and the focal length on z, so a view-space point
/// `(sx, sy, 1)` with `sx, sy` in `[-1, 1]` lands on the image plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
    field_of_view: f32,
    focal_length: f32,
    aspect_ratio: f32,

    ray_origin: Vec3,
    camera_to_world: Mat4,
    world_to_view: Mat4,
    world_to_clip: Mat4,
    view_rotation: Mat3,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}

impl Camera {
    /// Create a camera at `position` looking along `direction`.
    ///
    /// Field of view defaults to 70 degrees, focal length and aspect ratio to 1.
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        let mut camera = Self {
            position,
            direction: direction.normalize(),
            field_of_view: 70.0_f32.to_radians(),
            focal_length: 1.0,
            aspect_ratio: 1.0,
            ray_origin: Vec3::ZERO,
            camera_to_world: Mat4::IDENTITY,
            world_to_view: Mat4::IDENTITY,
            world_to_clip: Mat4::IDENTITY,
            view_rotation: Mat3::IDENTITY,
        };
        camera.update_transformation();
        camera
    }

    /// Builder-style field of view (radians).
    pub fn with_field_of_view(mut self, field_of_view: f32) -> Self {
        self.set_field_of_view(field_of_view);
        self
    }

    /// Builder-style aspect ratio from a pixel size.
    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.set_aspect_ratio_from_size(width, height);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn focal_length(&self) -> f32 {
        self.focal_length
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Eye point rays are cast from: the position pulled back by the focal length.
    pub fn ray_origin(&self) -> Vec3 {
        self.ray_origin
    }

    /// Camera-to-world transform including the field-of-view/focal scaling.
    pub fn camera_to_world(&self) -> Mat4 {
        self.camera_to_world
    }

    /// Inverse of [`Camera::camera_to_world`].
    pub fn world_to_view(&self) -> Mat4 {
        self.world_to_view
    }

    /// Projection composed with the inverse camera transform.
    ///
    /// `w` of the result is the camera-space depth.
    pub fn world_to_clip(&self) -> Mat4 {
        self.world_to_clip
    }

    /// Inverse of the orthonormal camera basis (world to camera rotation).
    pub fn view_rotation(&self) -> Mat3 {
        self.view_rotation
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_transformation();
    }

    /// Set the look direction. The vector is normalized.
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction / direction.length();
        self.update_transformation();
    }

    pub fn set_field_of_view(&mut self, field_of_view: f32) {
        self.field_of_view = field_of_view;
        self.update_transformation();
    }

    pub fn set_focal_length(&mut self, focal_length: f32) {
        self.focal_length = focal_length;
        self.update_transformation();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.update_transformation();
    }

    pub fn set_aspect_ratio_from_size(&mut self, width: u32, height: u32) {
        self.set_aspect_ratio(width as f32 / height as f32);
    }

    /// Map a view-space vector to world space (no translation).
    pub fn view_to_world_vector(&self, vector: Vec3) -> Vec3 {
        self.camera_to_world.transform_vector3(vector)
    }

    /// Map a world-space point to homogeneous clip space.
    pub fn world_to_clip_point(&self, point: Vec3) -> Vec4 {
        self.world_to_clip * point.extend(1.0)
    }

    /// Rotate the look direction, pivoting about the point one unit behind the camera.
    pub fn rotate(&mut self, rotation: Mat3) {
        self.position -= self.direction;
        self.direction = (rotation * self.direction).normalize();
        self.position += self.direction;
        self.update_transformation();
    }

    /// Rotate the camera position about `pivot`, then rotate the look direction.
    pub fn orbit(&mut self, rotation: Mat3, pivot: Vec3) {
        self.position = pivot + rotation * (self.position - pivot);
        self.rotate(rotation);
    }

    fn update_transformation(&mut self) {
        let fov = (self.field_of_view / 2.0).tan();
        let ratio = self.aspect_ratio.sqrt();
        let xf = fov * ratio;
        let yf = fov / ratio;
        let zf = self.focal_length;

        let z = self.direction;
        let x = Vec3::Y.cross(z).normalize();
        let y = z.cross(x);

        self.view_rotation = Mat3::from_cols(x, y, z).inverse();

        let axes = Mat3::from_cols(x * xf, y * yf, z * zf);
        self.ray_origin = self.position + axes * Vec3::NEG_Z;

        self.camera_to_world = Mat4::from_cols(
            axes.x_axis.extend(0.0),
            axes.y_axis.extend(0.0),
            axes.z_axis.extend(0.0),
            self.ray_origin.extend(1.0),
        );
        self.world_to_view = self.camera_to_world.inverse();
        self.world_to_clip = projection() * self.world_to_view;
    }
}

/// Perspective projection with `clip.w = z` and `clip.z / clip.w` mapping
/// `[VIEW_NEAR, VIEW_FAR]` onto `[FRUSTUM_NEAR, FRUSTUM_FAR]`.
fn projection() -> Mat4 {
    let factor = (FRUSTUM_NEAR - FRUSTUM_FAR) / (VIEW_FAR - VIEW_NEAR) * VIEW_FAR;
    let a = FRUSTUM_NEAR - factor;
    let b = factor * VIEW_NEAR;

    Mat4::from_cols(
        Vec4::X,
        Vec4::Y,
        Vec4::new(0.0, 0.0, a, 1.0),
        Vec4::new(0.0, 0.0, b, 0.0),
    )
}
