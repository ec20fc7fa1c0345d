use glow::HasContext;

use crate::{
    error_check,
    GraphicsContext,
};

/// Depth-only render target for a directional light.
///
/// Owns one framebuffer and one 2D depth texture, sized at construction.
/// `begin_write`/`end_write` bracket the depth pass; nothing else may bind
/// a framebuffer between them.
pub struct ShadowMap {
    fbo : glow::Framebuffer,
    tex : glow::Texture,
    width : u32,
    height : u32,
}

impl ShadowMap {
    pub fn new(ctx : &GraphicsContext, width : u32, height : u32) -> Self {
        let gl = &ctx.gl;

        unsafe {
            let fbo = gl.create_framebuffer().unwrap();
            let tex = gl.create_texture().unwrap();

            gl.bind_texture(glow::TEXTURE_2D, Some(tex));

            gl.tex_image_2d(
                glow::TEXTURE_2D, // target
                0, // level
                glow::DEPTH_COMPONENT24 as i32, // internalformat
                width as i32,
                height as i32,
                0, // border
                glow::DEPTH_COMPONENT, // format
                glow::FLOAT, // type
                None, // data
            );

            error_check(gl);

            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );

            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );

            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_BORDER as i32,
            );

            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_BORDER as i32,
            );

            // samples past the map's edge read max depth, i.e. lit
            gl.tex_parameter_f32_slice(
                glow::TEXTURE_2D,
                glow::TEXTURE_BORDER_COLOR,
                &[1.0, 1.0, 1.0, 1.0],
            );

            error_check(gl);

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));

            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::TEXTURE_2D,
                Some(tex),
                0, // level
            );

            gl.draw_buffer(glow::NONE);
            gl.read_buffer(glow::NONE);

            error_check(gl);

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                println!("Framebuffer error: {}", status);
            }

            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.bind_texture(glow::TEXTURE_2D, None);

            error_check(gl);

            Self{ fbo, tex, width, height }
        }
    }

    pub fn begin_write(&self, ctx : &GraphicsContext) {
        unsafe {
            ctx.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            ctx.gl.viewport(
                0,
                0,
                self.width as i32,
                self.height as i32,
            );
        }

        error_check(&ctx.gl);
    }

    pub fn end_write(&self, ctx : &GraphicsContext) {
        unsafe {
            ctx.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }

        error_check(&ctx.gl);
    }

    /// Binds the depth texture for sampling in a later color pass.
    pub fn read(&self, ctx : &GraphicsContext, unit : u32) {
        unsafe {
            ctx.gl.active_texture(glow::TEXTURE0 + unit);
            ctx.gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
        }

        error_check(&ctx.gl);
    }

    pub fn release(self, ctx : &GraphicsContext) {
        unsafe {
            ctx.gl.delete_framebuffer(self.fbo);
            ctx.gl.delete_texture(self.tex);
        }

        error_check(&ctx.gl);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn texture(&self) -> glow::Texture {
        self.tex
    }
}

/// Depth-only cube-map render target for point and spot lights.
///
/// The cube texture is attached whole, so the omni depth program's geometry
/// stage can route each triangle to all six faces in one draw. The per-face
/// view-projection matrices are not stored here; see
/// [`crate::light::omni_light_transforms`].
pub struct OmniShadowMap {
    fbo : glow::Framebuffer,
    tex : glow::Texture,
    width : u32,
    height : u32,
}

impl OmniShadowMap {
    pub fn new(ctx : &GraphicsContext, width : u32, height : u32) -> Self {
        let gl = &ctx.gl;

        unsafe {
            let fbo = gl.create_framebuffer().unwrap();
            let tex = gl.create_texture().unwrap();

            gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(tex));

            for face in 0..6 {
                gl.tex_image_2d(
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X + face, // target
                    0, // level
                    glow::DEPTH_COMPONENT24 as i32, // internalformat
                    width as i32,
                    height as i32,
                    0, // border
                    glow::DEPTH_COMPONENT, // format
                    glow::FLOAT, // type
                    None, // data
                );
            }

            error_check(gl);

            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );

            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );

            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );

            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );

            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_WRAP_R,
                glow::CLAMP_TO_EDGE as i32,
            );

            error_check(gl);

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));

            // layered attachment, gl_Layer selects the face
            gl.framebuffer_texture(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                Some(tex),
                0, // level
            );

            gl.draw_buffer(glow::NONE);
            gl.read_buffer(glow::NONE);

            error_check(gl);

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                println!("Framebuffer error: {}", status);
            }

            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);

            error_check(gl);

            Self{ fbo, tex, width, height }
        }
    }

    pub fn begin_write(&self, ctx : &GraphicsContext) {
        unsafe {
            ctx.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            ctx.gl.viewport(
                0,
                0,
                self.width as i32,
                self.height as i32,
            );
        }

        error_check(&ctx.gl);
    }

    pub fn end_write(&self, ctx : &GraphicsContext) {
        unsafe {
            ctx.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }

        error_check(&ctx.gl);
    }

    pub fn read(&self, ctx : &GraphicsContext, unit : u32) {
        unsafe {
            ctx.gl.active_texture(glow::TEXTURE0 + unit);
            ctx.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(self.tex));
        }

        error_check(&ctx.gl);
    }

    pub fn release(self, ctx : &GraphicsContext) {
        unsafe {
            ctx.gl.delete_framebuffer(self.fbo);
            ctx.gl.delete_texture(self.tex);
        }

        error_check(&ctx.gl);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
