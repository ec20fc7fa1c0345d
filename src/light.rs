use std::f32::consts::FRAC_PI_2;

use glam::{
    const_vec3,
    Vec3,
    Mat4,
};

pub const MAX_POINT_LIGHTS : usize = 3;
pub const MAX_SPOT_LIGHTS : usize = 3;

/// Distance at which omni shadow depth saturates, also the far plane of the
/// cube-face projections. Uploaded as `u_FarPlane`.
pub const OMNI_FAR_PLANE : f32 = 100.0;

/// Directional light record, laid out to match the std140 block in
/// `shaders/phong.frag`. Each `Vec3` is padded to 16 bytes by the scalar
/// that follows it.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    pub color : Vec3,
    pub ambient_intensity : f32,
    pub direction : Vec3,
    pub diffuse_intensity : f32,
}

// repr(C), f32 fields only, no implicit padding
unsafe impl bytemuck::Zeroable for DirectionalLight {}
unsafe impl bytemuck::Pod for DirectionalLight {}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self{
            color : Vec3::ONE,
            ambient_intensity : 0.0,
            direction : const_vec3!([0.0, -1.0, 0.0]),
            diffuse_intensity : 0.0,
        }
    }
}

impl DirectionalLight {
    /// View-projection matrix of the directional depth pass, uploaded as
    /// `u_LightSpaceTransform`. The light is placed back along its own
    /// direction so the orthographic box covers the scene around the
    /// origin.
    pub fn light_space_transform(
        &self,
        extent : f32,
        near : f32,
        far : f32,
    ) -> Mat4 {
        let dir = self.direction.normalize_or_zero();

        let up = if dir.cross(Vec3::Y).length_squared() > 1e-6 {
            Vec3::Y
        } else {
            dir.any_orthonormal_vector()
        };

        let proj = Mat4::orthographic_rh_gl(
            -extent, extent,
            -extent, extent,
            near, far,
        );

        let view = Mat4::look_at_rh(
            -dir * (far * 0.5),
            Vec3::ZERO,
            up,
        );

        proj * view
    }
}

/// Point light record in std140 layout; 48 bytes. `pad` fills the last
/// 16-byte slot after the attenuation coefficients.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    pub color : Vec3,
    pub ambient_intensity : f32,
    pub position : Vec3,
    pub diffuse_intensity : f32,
    pub constant : f32,
    pub linear : f32,
    pub exponent : f32,
    pub pad : f32,
}

unsafe impl bytemuck::Zeroable for PointLight {}
unsafe impl bytemuck::Pod for PointLight {}

impl Default for PointLight {
    fn default() -> Self {
        Self{
            color : Vec3::ONE,
            ambient_intensity : 0.0,
            position : Vec3::ZERO,
            diffuse_intensity : 0.0,
            constant : 1.0,
            linear : 0.0,
            exponent : 0.0,
            pad : 0.0,
        }
    }
}

/// Spot light record: a point light plus a cone. `edge` is the cosine of
/// the cone's half angle. 64 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SpotLight {
    pub color : Vec3,
    pub ambient_intensity : f32,
    pub position : Vec3,
    pub diffuse_intensity : f32,
    pub constant : f32,
    pub linear : f32,
    pub exponent : f32,
    pub pad : f32,
    pub direction : Vec3,
    pub edge : f32,
}

unsafe impl bytemuck::Zeroable for SpotLight {}
unsafe impl bytemuck::Pod for SpotLight {}

impl Default for SpotLight {
    fn default() -> Self {
        Self{
            color : Vec3::ONE,
            ambient_intensity : 0.0,
            position : Vec3::ZERO,
            diffuse_intensity : 0.0,
            constant : 1.0,
            linear : 0.0,
            exponent : 0.0,
            pad : 0.0,
            direction : const_vec3!([0.0, -1.0, 0.0]),
            edge : 0.9,
        }
    }
}

/// The whole light state of a frame, uploaded wholesale into the
/// `LightBlock` uniform buffer. Counts say how many array slots are live.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct LightBlock {
    pub directional : DirectionalLight,
    pub point_lights : [PointLight; MAX_POINT_LIGHTS],
    pub spot_lights : [SpotLight; MAX_SPOT_LIGHTS],
    pub point_light_count : i32,
    pub spot_light_count : i32,
    pub pad : [i32; 2],
}

unsafe impl bytemuck::Zeroable for LightBlock {}
unsafe impl bytemuck::Pod for LightBlock {}

impl LightBlock {
    pub fn new(
        directional : Option<&DirectionalLight>,
        point_lights : &[PointLight],
        spot_lights : &[SpotLight],
    ) -> Self {
        let directional = directional.copied().unwrap_or_default();

        if point_lights.len() > MAX_POINT_LIGHTS
            || spot_lights.len() > MAX_SPOT_LIGHTS
        {
            panic!("light count exceeds shader limits");
        }

        let mut points = [PointLight::default(); MAX_POINT_LIGHTS];
        points[..point_lights.len()].copy_from_slice(point_lights);

        let mut spots = [SpotLight::default(); MAX_SPOT_LIGHTS];
        spots[..spot_lights.len()].copy_from_slice(spot_lights);

        Self{
            directional,
            point_lights : points,
            spot_lights : spots,
            point_light_count : point_lights.len() as i32,
            spot_light_count : spot_lights.len() as i32,
            pad : [0; 2],
        }
    }
}

// cube-map face enumeration order: +X, -X, +Y, -Y, +Z, -Z. The up vectors
// are the GL cube-map convention; changing them mirrors or rotates the
// sampled shadows.
pub const CUBE_FACES : [(Vec3, Vec3); 6] = [
    (const_vec3!([ 1.0,  0.0,  0.0]), const_vec3!([0.0, -1.0,  0.0])),
    (const_vec3!([-1.0,  0.0,  0.0]), const_vec3!([0.0, -1.0,  0.0])),
    (const_vec3!([ 0.0,  1.0,  0.0]), const_vec3!([0.0,  0.0,  1.0])),
    (const_vec3!([ 0.0, -1.0,  0.0]), const_vec3!([0.0,  0.0, -1.0])),
    (const_vec3!([ 0.0,  0.0,  1.0]), const_vec3!([0.0, -1.0,  0.0])),
    (const_vec3!([ 0.0,  0.0, -1.0]), const_vec3!([0.0, -1.0,  0.0])),
];

/// The six cube-face view-projection matrices for an omni light at
/// `position`, in cube-map face order. Recomputed every pass, never
/// stored; uploaded as `u_LightMatrices[0..5]`.
pub fn omni_light_transforms(position : Vec3, far : f32) -> [Mat4; 6] {
    let proj = Mat4::perspective_rh_gl(FRAC_PI_2, 1.0, 0.1, far);

    CUBE_FACES.map(|(dir, up)| {
        proj * Mat4::look_at_rh(position, position + dir, up)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::mem::size_of;
    use glam::Vec4;

    #[test]
    fn record_layouts() {
        assert_eq!(size_of::<DirectionalLight>(), 32);
        assert_eq!(size_of::<PointLight>(), 48);
        assert_eq!(size_of::<SpotLight>(), 64);

        assert_eq!(
            size_of::<LightBlock>(),
            32 + 48 * MAX_POINT_LIGHTS + 64 * MAX_SPOT_LIGHTS + 16,
        );
    }

    fn assert_near(got : f32, want : f32) {
        assert!(
            (got - want).abs() < 1e-4,
            "got {}, want {}",
            got,
            want,
        );
    }

    #[test]
    fn cube_faces_map_to_face_centers() {
        let position = Vec3::new(3.0, -2.0, 7.5);
        let transforms = omni_light_transforms(position, 50.0);

        for (i, (dir, _)) in CUBE_FACES.iter().enumerate() {
            let clip = transforms[i]
                * (position + *dir).extend(1.0);

            assert_near(clip.x / clip.w, 0.0);
            assert_near(clip.y / clip.w, 0.0);

            let depth = clip.z / clip.w;
            assert!(
                (-1.0..1.0).contains(&depth),
                "face {} depth {} outside clip volume",
                i,
                depth,
            );
        }
    }

    #[test]
    fn cube_faces_are_disjoint() {
        // a point in front of face i must be behind the near plane (or off
        // screen) for every other face
        let position = Vec3::ZERO;
        let transforms = omni_light_transforms(position, 50.0);

        for (i, (dir, _)) in CUBE_FACES.iter().enumerate() {
            for (j, t) in transforms.iter().enumerate() {
                if i == j {
                    continue;
                }

                let clip = *t * (position + *dir).extend(1.0);
                let visible = clip.w > 0.0
                    && (clip.x / clip.w).abs() < 1.0
                    && (clip.y / clip.w).abs() < 1.0
                    && (clip.z / clip.w).abs() < 1.0;

                assert!(
                    !visible,
                    "axis {} visible through face {}",
                    i,
                    j,
                );
            }
        }
    }

    #[test]
    fn directional_transform_centers_origin() {
        let light = DirectionalLight{
            direction : Vec3::new(1.0, -2.0, 0.5),
            diffuse_intensity : 1.0,
            ..Default::default()
        };

        let clip = light.light_space_transform(20.0, 0.1, 100.0)
            * Vec4::W;

        assert_near(clip.x / clip.w, 0.0);
        assert_near(clip.y / clip.w, 0.0);
    }

    #[test]
    fn directional_transform_handles_vertical_light() {
        // straight-down light must not produce a degenerate view matrix
        let light = DirectionalLight{
            direction : Vec3::new(0.0, -1.0, 0.0),
            diffuse_intensity : 1.0,
            ..Default::default()
        };

        let transform = light.light_space_transform(20.0, 0.1, 100.0);

        assert!(transform.is_finite());
        assert!(transform.determinant().abs() > 1e-6);
    }

    #[test]
    fn light_block_counts() {
        let block = LightBlock::new(
            None,
            &[PointLight::default(); 2],
            &[SpotLight::default(); 1],
        );

        assert_eq!(block.point_light_count, 2);
        assert_eq!(block.spot_light_count, 1);

        // default directional has no diffuse contribution
        assert_near(block.directional.diffuse_intensity, 0.0);
    }
}
