use shadow_lib::*;

use program::{
    LoadedProg,
    UniformValue,
};

use object::{
    LoadedObj,
    Obj,
};

use std::time::{Instant, Duration};
use std::f32::consts::PI;

use winit_input_helper::WinitInputHelper;

use glam::{
    Vec3,
    Mat4,
};

struct Demo0 {
    prog : LoadedProg,
    pyramid : LoadedObj,

    angle : f32,

    input : WinitInputHelper,
    time : Instant,
}

impl App for Demo0 {
    fn init(ctx : &mut GraphicsContext) -> Self {
        ctx.set_title("demo0 - pyramid");

        let (major, minor) = ctx.gl_version();
        println!("OpenGL version: {}.{}", major, minor);

        let prog = match ctx.load_program(
            include_str!("../shaders/basic.vert"),
            include_str!("../shaders/basic.frag"),
        ) {
            Ok(v) => v,
            Err(s) => {
                println!("SHADER ERROR: ");
                println!("{}", s);
                std::process::exit(1);
            }
        };

        let pyramid = ctx.load_object(&Obj::pyramid());

        Self{
            prog,
            pyramid,
            angle : 0.0,
            input : WinitInputHelper::new(),
            time : Instant::now(),
        }
    }

    fn update(
        &mut self,
        event : glutin::event::Event<'_, ()>,
        ctx : &mut GraphicsContext,
        control_flow : &mut glutin::event_loop::ControlFlow,
    ) {
        let mut quit = false;

        if self.input.update(&event) {
            use glutin::event::VirtualKeyCode;

            if self.input.key_pressed(VirtualKeyCode::Q) {
                quit = true;
            }
        }

        let now = Instant::now();
        let next_draw = self.time + (Duration::from_secs(1) / 60);

        if is_redraw_event(&event) {
            ctx.clear(0.1, 0.1, 0.1, 1.0);

            let delta = now - self.time;
            self.time = now;

            self.angle += delta.as_secs_f32() * PI / 4.0;

            let model = Mat4::from_translation(
                Vec3::new(0.0, 0.0, -2.5)
            ) * Mat4::from_rotation_y(self.angle);

            let projection = Mat4::perspective_rh_gl(
                PI / 4.0,
                ctx.aspect(),
                0.1,
                100.0,
            );

            ctx.render_object(
                &self.prog,
                &self.pyramid,
                &[
                    ("u_Model", UniformValue::Mat4(model)),
                    ("u_Projection", UniformValue::Mat4(projection)),
                ][..],
            );

            ctx.swap_buffers();
        }

        *control_flow = if quit {
            glutin::event_loop::ControlFlow::Exit
        } else {
            glutin::event_loop::ControlFlow::WaitUntil(
                next_draw,
            )
        };
    }
}

fn main() {
    run::<Demo0>();
}
