pub mod camera;
use camera::*;

pub mod utils;
use utils::{
    create_display,
};

pub mod program;
use program::{
    LoadedProg,
    Uniforms,
    UniformValue,
    UniformSetter,
};

pub mod object;
use object::{
    LoadedObj,
    Obj,
};

pub mod light;
use light::{
    LightBlock,
    omni_light_transforms,
    OMNI_FAR_PLANE,
    MAX_POINT_LIGHTS,
    MAX_SPOT_LIGHTS,
};

pub mod shadow;
use shadow::{
    ShadowMap,
    OmniShadowMap,
};

pub mod scene;
use scene::{
    Scene,
    DIRECTIONAL_SHADOW_UNIT,
    OMNI_SHADOW_UNIT_BASE,
};

pub mod uniform_buffer;
use uniform_buffer::UniformBuffer;

const SHADOW_MAP_SIZE : u32 = 2048;
const OMNI_SHADOW_MAP_SIZE : u32 = 1024;

const LIGHT_BLOCK_BINDING : u32 = 0;

// orthographic box of the directional depth pass
const DIRECTIONAL_SHADOW_EXTENT : f32 = 50.0;
const DIRECTIONAL_SHADOW_NEAR : f32 = 0.1;
const DIRECTIONAL_SHADOW_FAR : f32 = 100.0;

use glam::{
    Vec3,
    Mat4,
};

use glow::HasContext;

/// Draws the directional shadow map's depth onto a plane, linearized
/// between `near` and `far`.
pub struct DepthDebug {
    prog : LoadedProg,
    plane : LoadedObj,
}

impl DepthDebug {
    pub fn new(ctx : &GraphicsContext) -> Self {
        let prog = ctx.load_program(
            include_str!("shaders/depth_dbg.vert"),
            include_str!("shaders/depth_dbg.frag"),
        ).unwrap();

        let plane = ctx.load_object(
            &Obj::plane()
        );

        Self{prog, plane}
    }

    pub fn render(
        &self,
        ctx : &GraphicsContext,
        cache : &RenderCache,
    ) {
        unsafe {

            ctx.gl.use_program(Some(self.prog.prog));
            ctx.gl.bind_vertex_array(Some(self.plane.vao));

            error_check(&ctx.gl);

            ctx.gl.active_texture(glow::TEXTURE0);
            ctx.gl.bind_texture(
                glow::TEXTURE_2D,
                Some(cache.directional_map.texture()),
            );

            let u : &[(&str, UniformValue)] = &[
                ("u_Depth", UniformValue::Int(0)),
                ("u_Near", UniformValue::Float(DIRECTIONAL_SHADOW_NEAR)),
                ("u_Far", UniformValue::Float(DIRECTIONAL_SHADOW_FAR)),
            ][..];

            u.set_uniforms(&mut UniformSetter{
                gl : &ctx.gl,
                prog : &self.prog,
            });

            error_check(&ctx.gl);

            ctx.gl.draw_elements(
                glow::TRIANGLES,
                self.plane.count as i32,
                glow::UNSIGNED_INT,
                0
            );

            ctx.gl.use_program(None);
            ctx.gl.bind_vertex_array(None);
            ctx.gl.bind_texture(glow::TEXTURE_2D, None);

            error_check(&ctx.gl);
        }
    }
}

type GlutinContext = glutin::ContextWrapper<
    glutin::PossiblyCurrent,
    glutin::window::Window
>;


/// An arena allocator that only drops objects when the whole arena is
/// dropped
pub struct Recycler<T> {
    // the lenth of the current cache
    cursor : usize,
    data : Vec<T>,
}

impl<T> Recycler<T> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn recycle(&mut self) {
        self.cursor = 0;
    }

    pub fn allocate<F>(&mut self, alloc : F) -> &T
    where
        F : FnOnce() -> T,
    {
        assert!(self.data.len() >= self.cursor);

        if self.cursor >= self.data.len() {
            self.data.push(alloc());
        }

        let ret = &self.data[self.cursor];
        self.cursor += 1;
        ret
    }

    /// Iterates the objects allocated since the last `recycle`, in
    /// allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data[..self.cursor].iter()
    }
}

impl<T> Default for Recycler<T> {
    fn default() -> Self {
        Self{
            cursor : 0,
            data : Vec::new(),
        }
    }
}

/// GPU resources the multi-pass renderer keeps across frames: the two
/// depth-only programs, the directional shadow map, a pool of omni shadow
/// maps sized by the busiest frame so far, and the light uniform buffer.
pub struct RenderCache {
    shadow_prog : LoadedProg,
    omni_prog : LoadedProg,
    directional_map : ShadowMap,
    omni_maps : Recycler<OmniShadowMap>,
    light_block : UniformBuffer,
}

impl RenderCache {
    pub fn new(ctx : &GraphicsContext) -> Self {
        let shadow_prog = ctx.load_program(
            include_str!("shaders/shadow.vert"),
            include_str!("shaders/shadow.frag"),
        ).unwrap();

        let omni_prog = ctx.load_program_with_geometry(
            include_str!("shaders/omni_shadow.vert"),
            include_str!("shaders/omni_shadow.geom"),
            include_str!("shaders/omni_shadow.frag"),
        ).unwrap();

        let directional_map = ShadowMap::new(
            ctx,
            SHADOW_MAP_SIZE,
            SHADOW_MAP_SIZE,
        );

        let light_block = UniformBuffer::new(
            ctx,
            std::mem::size_of::<LightBlock>(),
            LIGHT_BLOCK_BINDING,
        );

        Self{
            shadow_prog,
            omni_prog,
            directional_map,
            omni_maps : Recycler::new(),
            light_block,
        }
    }
}

pub struct GraphicsContext {
    gl : glow::Context,
    gl_window : GlutinContext,
    egui : egui_glow::EguiGlow,
}

impl GraphicsContext {
    pub fn render_egui<T>(
        &mut self,
        mut f : impl FnMut(&egui::CtxRef) -> T
    ) -> T {
        self.egui.begin_frame(self.gl_window.window());

        let ret = (f)(self.egui.ctx());

        let (needs_repaint, shapes) = self.egui.end_frame(
            self.gl_window.window()
        );

        if needs_repaint {
            self.gl_window.window().request_redraw();
        }

        self.egui.paint(&self.gl_window, &self.gl, shapes);

        ret
    }

    pub fn set_title(&self, s : &str) {
        self.gl_window.window().set_title(s);
    }

    pub fn aspect(&self) -> f32 {
        let scale = self.gl_window.window().scale_factor();
        let size : glutin::dpi::LogicalSize<f32> = self.gl_window.window().inner_size().to_logical(scale);
        (size.width as f32) / (size.height as f32)
    }

    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.gl_window.window().inner_size();

        (size.width, size.height)
    }

    pub fn logical_size(&self) -> (u32, u32) {
        let scale = self.gl_window.window().scale_factor();
        let size = self.gl_window.window().inner_size().to_logical(scale);

        (size.width, size.height)
    }

    pub fn swap_buffers(&self) {
        self.gl_window.swap_buffers().unwrap();
    }

    pub fn load_object(&self, obj : &Obj) -> LoadedObj {
        let vao;
        let index_vbo;
        let vertex_vbo;
        let normal_vbo;

        unsafe {
            vao = self.gl.create_vertex_array().unwrap();
            self.gl.bind_vertex_array(Some(vao));
        }

        error_check(&self.gl);

        // load vertices
        unsafe {
            vertex_vbo = self.gl.create_buffer().unwrap();
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&obj.vertices),
                glow::STATIC_DRAW,
            );
            self.gl.enable_vertex_attrib_array(0);

            self.gl.vertex_attrib_pointer_f32(
                0,
                3,
                glow::FLOAT,
                false,
                0,
                0,
            );

        }

        // load normals
        unsafe {
            normal_vbo = self.gl.create_buffer().unwrap();
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(normal_vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&obj.normals),
                glow::STATIC_DRAW,
            );
            self.gl.enable_vertex_attrib_array(1);
            self.gl.vertex_attrib_pointer_f32(
                1,
                3,
                glow::FLOAT,
                false,
                0,
                0,
            );
        }

        // load indices
        unsafe {
            index_vbo = self.gl.create_buffer().unwrap();
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_vbo));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&obj.indices),
                glow::STATIC_DRAW,
            );
        }

        unsafe {
            self.gl.bind_vertex_array(None);
        }

        error_check(&self.gl);

        LoadedObj{
            vao, index_vbo, vertex_vbo, normal_vbo,
            count : obj.indices.len(),
        }
    }

    pub fn unload_object(&self, obj : LoadedObj) {
        unsafe {
            self.gl.delete_vertex_array(obj.vao);
            self.gl.delete_buffer(obj.vertex_vbo);
            self.gl.delete_buffer(obj.normal_vbo);
            self.gl.delete_buffer(obj.index_vbo);
        }

        error_check(&self.gl);
    }

    fn compile_stage(
        &self,
        shader_type : u32,
        src : &str,
    ) -> Result<glow::NativeShader, String> {
        unsafe {
            let shader = self.gl.create_shader(shader_type).unwrap();
            self.gl.shader_source(shader, src);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let s = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(s)
            }

            Ok(shader)
        }
    }

    fn link_stages(
        &self,
        stages : &[(u32, &str)],
    ) -> Result<LoadedProg, String> {
        let mut shaders = Vec::with_capacity(stages.len());

        for (shader_type, src) in stages.iter() {
            match self.compile_stage(*shader_type, src) {
                Ok(shader) => shaders.push(shader),
                Err(e) => {
                    unsafe {
                        for shader in shaders {
                            self.gl.delete_shader(shader);
                        }
                    }
                    return Err(e)
                },
            }
        }

        let prog;
        unsafe {
            prog = self.gl.create_program().unwrap();

            for shader in shaders.iter() {
                self.gl.attach_shader(prog, *shader);
            }

            self.gl.link_program(prog);

            for shader in shaders {
                self.gl.detach_shader(prog, shader);
                self.gl.delete_shader(shader);
            }

            if !self.gl.get_program_link_status(prog) {
                let s = self.gl.get_program_info_log(prog);
                self.gl.delete_program(prog);
                return Err(s);
            }
        }

        let n = unsafe {
            self.gl.get_active_uniforms(prog)
        };

        let mut active_uniforms = Vec::with_capacity(n as usize);

        for i in 0..n {
            let u = unsafe {
                self.gl.get_active_uniform(
                    prog,
                    i
                ).unwrap()
            };

            // uniforms living in a uniform block have no location
            let loc = match unsafe {
                self.gl.get_uniform_location(prog, &u.name)
            } {
                Some(loc) => loc,
                None => continue,
            };

            active_uniforms.push((u, loc));
        }

        active_uniforms.sort_unstable_by(|left, right| {
            left.0.name.cmp(&right.0.name)
        });

        Ok(LoadedProg{
            prog,
            active_uniforms: active_uniforms.into_boxed_slice().into(),
        })
    }

    pub fn load_program(
        &self,
        vert_src : &str,
        frag_src : &str,
    ) -> Result<LoadedProg, String> {
        self.link_stages(&[
            (glow::VERTEX_SHADER, vert_src),
            (glow::FRAGMENT_SHADER, frag_src),
        ])
    }

    /// Like `load_program`, with a geometry stage in between. The omni
    /// depth pass uses this to fan each triangle out to six cube faces.
    pub fn load_program_with_geometry(
        &self,
        vert_src : &str,
        geom_src : &str,
        frag_src : &str,
    ) -> Result<LoadedProg, String> {
        self.link_stages(&[
            (glow::VERTEX_SHADER, vert_src),
            (glow::GEOMETRY_SHADER, geom_src),
            (glow::FRAGMENT_SHADER, frag_src),
        ])
    }

    pub fn unload_program(
        &self,
        prog : LoadedProg,
    ) {
        unsafe {
            self.gl.delete_program(prog.prog);
        }

        error_check(&self.gl);
    }

    fn set_texture_parameters(&self) {
        unsafe {
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );

            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );

            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );

            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
        }
    }

    pub fn texture_2d_image(
        &self,
        img : &image::RgbImage,
    ) -> glow::Texture {

        unsafe {
            let tex = self.gl.create_texture().unwrap();
            self.gl.bind_texture(glow::TEXTURE_2D, Some(tex));

            self.gl.tex_image_2d(
                glow::TEXTURE_2D, // target
                0, // level
                glow::RGB as i32, // internalformat
                img.width() as i32,
                img.height() as i32,
                0, // border
                glow::RGB, // format
                glow::UNSIGNED_BYTE, // type
                Some(img.as_raw()), // data
            );

            self.set_texture_parameters();

            self.gl.bind_texture(glow::TEXTURE_2D, None);

            tex
        }
    }

    pub fn clear(&self, r : f32, g : f32, b : f32, a : f32) {
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    /// major, minor
    pub fn gl_version(&self) -> (i32, i32) {
        unsafe {
            let major = self.gl.get_parameter_i32(
                glow::MAJOR_VERSION,
            );

            let minor = self.gl.get_parameter_i32(
                glow::MINOR_VERSION,
            );

            (major, minor)
        }
    }

    /// Single-object draw with caller-supplied uniforms. The simpler
    /// demos use this; the multi-pass path is `render_scene`.
    pub fn render_object<U : Uniforms>(
        &self,
        prog : &LoadedProg,
        object : &LoadedObj,
        uniforms : U,
    ) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.disable(glow::SCISSOR_TEST);

            let (w, h) = self.physical_size();
            self.gl.viewport(0, 0, w as i32, h as i32);

            self.gl.use_program(Some(prog.prog));
            self.gl.bind_vertex_array(Some(object.vao));
        }

        error_check(&self.gl);

        uniforms.set_uniforms(&mut UniformSetter{
            gl : &self.gl,
            prog,
        });

        unsafe {
            self.gl.draw_elements(
                glow::TRIANGLES,
                object.count as i32,
                glow::UNSIGNED_INT,
                0
            );

            self.gl.use_program(None);
            self.gl.bind_vertex_array(None);
            self.gl.disable(glow::DEPTH_TEST);
            self.gl.enable(glow::SCISSOR_TEST);
        }

        error_check(&self.gl);
    }

    /// Depth-only draw of every shadow-casting surface. The caller has
    /// bound the target framebuffer and program and set the per-pass
    /// uniforms; this sets `u_Model` per surface.
    fn draw_casters(
        &self,
        prog : &LoadedProg,
        scene : &Scene<LoadedObj>,
    ) {
        let mut prev_vao = None;

        scene.visit_surfaces(
            &mut |model, surface, object : &LoadedObj| {
                if !surface.cast_shadow {
                    return
                }

                let u = &[
                    ("u_Model", UniformValue::Mat4(model)),
                ][..];

                u.set_uniforms(&mut UniformSetter{
                    gl : &self.gl,
                    prog,
                });

                unsafe {
                    let vao = Some(object.vao);
                    if vao != prev_vao {
                        self.gl.bind_vertex_array(vao);
                        prev_vao = vao;
                    }

                    self.gl.draw_elements(
                        glow::TRIANGLES,
                        object.count as i32,
                        glow::UNSIGNED_INT,
                        0
                    );
                }

                error_check(&self.gl);
            }
        );
    }

    /// One omni depth pass: allocates a cube map from the pool, derives
    /// the six face matrices from `position` and draws every caster once.
    fn omni_pass(
        &self,
        cache : &mut RenderCache,
        position : Vec3,
        scene : &Scene<LoadedObj>,
    ) {
        let map = cache.omni_maps.allocate(|| {
            OmniShadowMap::new(
                self,
                OMNI_SHADOW_MAP_SIZE,
                OMNI_SHADOW_MAP_SIZE,
            )
        });

        map.begin_write(self);

        unsafe {
            self.gl.clear(glow::DEPTH_BUFFER_BIT);
            self.gl.use_program(Some(cache.omni_prog.prog));
        }

        error_check(&self.gl);

        let transforms = omni_light_transforms(position, OMNI_FAR_PLANE);

        let setter = UniformSetter{
            gl : &self.gl,
            prog : &cache.omni_prog,
        };

        setter.set("u_LightMatrices[0]", &transforms[..]);
        setter.set("u_LightPos", position);
        setter.set("u_FarPlane", OMNI_FAR_PLANE);

        self.draw_casters(&cache.omni_prog, scene);

        map.end_write(self);
    }

    /// Renders one frame in four fixed phases: the directional depth
    /// pass, one omni depth pass per point light, one per spot light, and
    /// the color pass sampling every map. The phases share nothing but the
    /// GL queue; submission order is the only synchronization.
    pub fn render_scene(
        &self,
        cache : &mut RenderCache,
        camera : &Camera,
        scene : &Scene<LoadedObj>,
        prog : &LoadedProg,
    ) {
        let directional_transform = scene.directional_light().map(|l| {
            l.light_space_transform(
                DIRECTIONAL_SHADOW_EXTENT,
                DIRECTIONAL_SHADOW_NEAR,
                DIRECTIONAL_SHADOW_FAR,
            )
        });

        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            // egui's painter leaves the scissor test enabled
            self.gl.disable(glow::SCISSOR_TEST);
        }

        error_check(&self.gl);

        // phase 1: directional shadow map
        if let Some(transform) = directional_transform {
            cache.directional_map.begin_write(self);

            unsafe {
                self.gl.clear(glow::DEPTH_BUFFER_BIT);
                self.gl.use_program(Some(cache.shadow_prog.prog));
            }

            error_check(&self.gl);

            let setter = UniformSetter{
                gl : &self.gl,
                prog : &cache.shadow_prog,
            };

            setter.set("u_LightSpaceTransform", transform);

            self.draw_casters(&cache.shadow_prog, scene);

            cache.directional_map.end_write(self);
        }

        // phases 2 and 3: omni maps for point lights, then spot lights.
        // spots reuse the cube map even though only a cone is lit.
        cache.omni_maps.recycle();

        for light in scene.point_lights() {
            self.omni_pass(cache, light.position, scene);
        }

        for light in scene.spot_lights() {
            self.omni_pass(cache, light.position, scene);
        }

        // phase 4: color pass over the window, sampling all of the above
        let block = LightBlock::new(
            scene.directional_light(),
            scene.point_lights(),
            scene.spot_lights(),
        );

        cache.light_block.set_data(self, &block, 0);

        unsafe {
            self.gl.use_program(Some(prog.prog));

            let (w, h) = self.physical_size();
            self.gl.viewport(0, 0, w as i32, h as i32);
        }

        error_check(&self.gl);

        let setter = UniformSetter{
            gl : &self.gl,
            prog,
        };

        setter.set("u_Projection", camera.projection());
        setter.set("u_View", camera.view());
        setter.set("u_EyePosition", camera.position);
        setter.set(
            "u_LightSpaceTransform",
            directional_transform.unwrap_or(Mat4::IDENTITY),
        );
        setter.set("u_FarPlane", OMNI_FAR_PLANE);

        cache.directional_map.read(self, DIRECTIONAL_SHADOW_UNIT);
        setter.set(
            "u_DirectionalShadowMap",
            DIRECTIONAL_SHADOW_UNIT as i32,
        );

        let mut units = [0i32; MAX_POINT_LIGHTS + MAX_SPOT_LIGHTS];
        for (i, unit) in units.iter_mut().enumerate() {
            *unit = (OMNI_SHADOW_UNIT_BASE + i as u32) as i32;
        }

        for (i, map) in cache.omni_maps.iter().enumerate() {
            map.read(self, OMNI_SHADOW_UNIT_BASE + i as u32);
        }

        setter.set("u_OmniShadowMaps[0]", &units[..]);

        let mut prev_vao = None;

        scene.visit_surfaces(
            &mut |model, surface, object : &LoadedObj| {
                let setter = UniformSetter{
                    gl : &self.gl,
                    prog,
                };

                setter.set("u_Model", model);
                surface.material.set_uniforms(&mut UniformSetter{
                    gl : &self.gl,
                    prog,
                });

                unsafe {
                    let vao = Some(object.vao);
                    if vao != prev_vao {
                        self.gl.bind_vertex_array(vao);
                        prev_vao = vao;
                    }

                    self.gl.draw_elements(
                        glow::TRIANGLES,
                        object.count as i32,
                        glow::UNSIGNED_INT,
                        0
                    );
                }

                error_check(&self.gl);
            }
        );

        unsafe {
            self.gl.active_texture(glow::TEXTURE0);
            self.gl.bind_texture(glow::TEXTURE_2D, None);

            self.gl.use_program(None);
            self.gl.bind_vertex_array(None);
            self.gl.disable(glow::DEPTH_TEST);
            self.gl.enable(glow::SCISSOR_TEST);
        }

        error_check(&self.gl);
    }
}


pub(crate) fn error_check(gl : &glow::Context) {
    assert_eq!(
        unsafe { gl.get_error() },
        glow::NO_ERROR,
        "OpenGL error occurred!"
    );
}

pub trait App {
    // load shaders, textures, etc.
    fn init(ctx : &mut GraphicsContext) -> Self;

    // do rendering
    fn update(
        &mut self,
        event : glutin::event::Event<'_, ()>,
        ctx : &mut GraphicsContext,
        control_flow : &mut glutin::event_loop::ControlFlow,
    );
}


pub fn is_redraw_event<T>(event : &glutin::event::Event<'_, T>) -> bool {
    // Platform-dependent event handlers to workaround a winit bug
    // See: https://github.com/rust-windowing/winit/issues/987
    // See: https://github.com/rust-windowing/winit/issues/1619
    match event {
        glutin::event::Event::RedrawEventsCleared if cfg!(windows) => true,
        glutin::event::Event::RedrawRequested(_) if !cfg!(windows) => true,
        _ => false,
    }
}

pub fn run<A : App + 'static>() {
    let event_loop = glutin::event_loop::EventLoop::with_user_event();
    let (gl_window, gl) = create_display(&event_loop);

    let egui = egui_glow::EguiGlow::new(&gl_window, &gl);

    let mut render_ctx = GraphicsContext {
        gl, gl_window, egui
    };

    let mut a = A::init(&mut render_ctx);


    event_loop.run(move |event, _, control_flow| {
        if let glutin::event::Event::WindowEvent { ref event, .. } = event {
            if render_ctx.egui.is_quit_event(&event) {
                *control_flow = glutin::event_loop::ControlFlow::Exit;
            }

            if let glutin::event::WindowEvent::Resized(physical_size) = event {
                render_ctx.gl_window.resize(*physical_size);
            }

            render_ctx.egui.on_event(&event);

            render_ctx.gl_window.window().request_redraw();
        }

        if let glutin::event::Event::LoopDestroyed = event {
            render_ctx.egui.destroy(&render_ctx.gl);
        }

        a.update(event, &mut render_ctx, control_flow);
    });
}
