use glow::HasContext;

use crate::{
    error_check,
    GraphicsContext,
};

/// GL uniform buffer bound to a fixed binding point, sized at creation.
/// Used to upload the Pod light records wholesale.
pub struct UniformBuffer {
    buf : glow::Buffer,
    size : usize,
}

impl UniformBuffer {
    pub fn new(ctx : &GraphicsContext, size : usize, binding : u32) -> Self {
        let buf = unsafe {
            let buf = ctx.gl.create_buffer().unwrap();

            ctx.gl.bind_buffer(glow::UNIFORM_BUFFER, Some(buf));
            ctx.gl.buffer_data_size(
                glow::UNIFORM_BUFFER,
                size as i32,
                glow::DYNAMIC_DRAW,
            );

            ctx.gl.bind_buffer_base(
                glow::UNIFORM_BUFFER,
                binding,
                Some(buf),
            );

            ctx.gl.bind_buffer(glow::UNIFORM_BUFFER, None);

            buf
        };

        error_check(&ctx.gl);

        Self{ buf, size }
    }

    /// Uploads `data` at `offset` bytes into the buffer. The write must
    /// stay inside the size given at creation.
    pub fn set_data<T>(
        &self,
        ctx : &GraphicsContext,
        data : &T,
        offset : usize,
    )
    where
        T : bytemuck::Pod,
    {
        let bytes = bytemuck::bytes_of(data);
        assert!(offset + bytes.len() <= self.size);

        unsafe {
            ctx.gl.bind_buffer(glow::UNIFORM_BUFFER, Some(self.buf));
            ctx.gl.buffer_sub_data_u8_slice(
                glow::UNIFORM_BUFFER,
                offset as i32,
                bytes,
            );
            ctx.gl.bind_buffer(glow::UNIFORM_BUFFER, None);
        }

        error_check(&ctx.gl);
    }

    pub fn release(self, ctx : &GraphicsContext) {
        unsafe {
            ctx.gl.delete_buffer(self.buf);
        }

        error_check(&ctx.gl);
    }
}
