use glam::Mat4;

use crate::light::{
    DirectionalLight,
    PointLight,
    SpotLight,
    MAX_POINT_LIGHTS,
    MAX_SPOT_LIGHTS,
};

use crate::program::{
    Uniforms,
    UniformSetter,
};

// texture unit 0 is reserved for material textures
pub const DIRECTIONAL_SHADOW_UNIT : u32 = 1;
pub const OMNI_SHADOW_UNIT_BASE : u32 = 2;

pub fn point_shadow_unit(point_index : usize) -> u32 {
    OMNI_SHADOW_UNIT_BASE + point_index as u32
}

pub fn spot_shadow_unit(point_count : usize, spot_index : usize) -> u32 {
    OMNI_SHADOW_UNIT_BASE + (point_count + spot_index) as u32
}

/// Phong material coefficients, uploaded as `u_Material.*`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Material {
    pub specular_intensity : f32,
    pub shininess : f32,
}

impl Material {
    pub fn shiny() -> Self {
        Self{
            specular_intensity : 4.0,
            shininess : 256.0,
        }
    }

    pub fn dull() -> Self {
        Self{
            specular_intensity : 0.3,
            shininess : 4.0,
        }
    }
}

impl Uniforms for Material {
    fn set_uniforms(&self, s : &mut UniformSetter<'_>) {
        s.set("u_Material.SpecularIntensity", self.specular_intensity);
        s.set("u_Material.Shininess", self.shininess);
    }
}

#[derive(Clone, Copy)]
pub struct Surface {
    pub cast_shadow : bool,
    pub material : Material,
}

/// Flat scene description for one frame: surfaces in draw order plus the
/// light lists, clamped to what the shader limits allow. Generic over the
/// object payload so it can be exercised without a GL context.
pub struct Scene<O> {
    surfaces : Vec<(Mat4, Surface, O)>,
    directional : Option<DirectionalLight>,
    point_lights : Vec<PointLight>,
    spot_lights : Vec<SpotLight>,
}

impl<O> Default for Scene<O> {
    fn default() -> Self {
        Self{
            surfaces : Vec::new(),
            directional : None,
            point_lights : Vec::new(),
            spot_lights : Vec::new(),
        }
    }
}

impl<O> Scene<O> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_surface(
        &mut self,
        model : Mat4,
        surface : Surface,
        object : O,
    ) {
        self.surfaces.push((model, surface, object));
    }

    pub fn set_directional_light(&mut self, light : DirectionalLight) {
        self.directional = Some(light);
    }

    /// Returns false when the light was dropped because the per-frame
    /// maximum is reached.
    pub fn add_point_light(&mut self, light : PointLight) -> bool {
        if self.point_lights.len() >= MAX_POINT_LIGHTS {
            return false
        }

        self.point_lights.push(light);
        true
    }

    pub fn add_spot_light(&mut self, light : SpotLight) -> bool {
        if self.spot_lights.len() >= MAX_SPOT_LIGHTS {
            return false
        }

        self.spot_lights.push(light);
        true
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
        self.directional = None;
        self.point_lights.clear();
        self.spot_lights.clear();
    }

    pub fn directional_light(&self) -> Option<&DirectionalLight> {
        self.directional.as_ref()
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn spot_lights(&self) -> &[SpotLight] {
        &self.spot_lights
    }

    pub fn visit_surfaces<F>(&self, f : &mut F)
    where
        F : FnMut(Mat4, &Surface, &O),
    {
        for (model, surface, object) in self.surfaces.iter() {
            f(*model, surface, object);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use glam::Vec3;

    #[test]
    fn surfaces_visit_in_draw_order() {
        let mut scene = Scene::<i32>::new();

        let trans1 = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let trans2 = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));

        let surface = Surface{
            cast_shadow : true,
            material : Material::dull(),
        };

        scene.add_surface(trans1, surface, -1);
        scene.add_surface(trans2, surface, -2);

        let mut visited = Vec::new();
        scene.visit_surfaces(&mut |model, _, object| {
            visited.push((model, *object));
        });

        assert_eq!(visited, vec![(trans1, -1), (trans2, -2)]);
    }

    #[test]
    fn light_counts_clamp() {
        let mut scene = Scene::<()>::new();

        for _ in 0..MAX_POINT_LIGHTS {
            assert!(scene.add_point_light(Default::default()));
        }
        assert!(!scene.add_point_light(Default::default()));

        for _ in 0..MAX_SPOT_LIGHTS {
            assert!(scene.add_spot_light(Default::default()));
        }
        assert!(!scene.add_spot_light(Default::default()));

        assert_eq!(scene.point_lights().len(), MAX_POINT_LIGHTS);
        assert_eq!(scene.spot_lights().len(), MAX_SPOT_LIGHTS);
    }

    #[test]
    fn clear_resets_lights() {
        let mut scene = Scene::<()>::new();

        scene.set_directional_light(Default::default());
        scene.add_point_light(Default::default());
        scene.add_surface(Mat4::IDENTITY, Surface{
            cast_shadow : false,
            material : Material::default(),
        }, ());

        scene.clear();

        assert!(scene.directional_light().is_none());
        assert!(scene.point_lights().is_empty());

        let mut count = 0;
        scene.visit_surfaces(&mut |_, _, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn shadow_units_pack_after_directional() {
        assert_eq!(point_shadow_unit(0), 2);
        assert_eq!(point_shadow_unit(2), 4);

        // spot maps follow whatever point maps exist
        assert_eq!(spot_shadow_unit(0, 0), 2);
        assert_eq!(spot_shadow_unit(3, 0), 5);
        assert_eq!(spot_shadow_unit(2, 1), 5);

        assert_ne!(spot_shadow_unit(1, 0), DIRECTIONAL_SHADOW_UNIT);
    }
}
