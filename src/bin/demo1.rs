use shadow_lib::*;

use camera::FlyCamera;

use program::LoadedProg;

use object::{
    LoadedObj,
    Obj,
};

use light::{
    DirectionalLight,
    PointLight,
    SpotLight,
};

use scene::{
    Material,
    Scene,
    Surface,
};

use std::time::{Instant, Duration};
use std::f32::consts::PI;

use winit_input_helper::WinitInputHelper;

use rand::{
    Rng,
    SeedableRng,
    rngs::SmallRng,
};

use glam::{
    Vec3,
    Mat4,
    Quat,
};

struct Demo1 {
    prog : LoadedProg,
    cache : RenderCache,
    depth_debug : DepthDebug,

    cube : LoadedObj,
    pyramid : LoadedObj,

    // model matrices of the scattered boxes, fixed at startup
    boxes : Vec<Mat4>,

    camera : FlyCamera,
    angle : f32,

    show_gui : bool,
    show_depth : bool,
    flashlight : bool,
    sun_angle : f32,

    input : WinitInputHelper,
    time : Instant,
}

fn scatter_boxes(count : usize) -> Vec<Mat4> {
    let mut rng = SmallRng::seed_from_u64(0xdeadbeef);
    let mut boxes = Vec::with_capacity(count);

    for _ in 0..count {
        let translation = Vec3::new(
            rng.gen_range(-20.0..20.0),
            rng.gen_range(0.0..4.0),
            rng.gen_range(-20.0..20.0),
        );

        let rotation = Quat::from_rotation_y(
            rng.gen_range(0.0..(2.0 * PI))
        );

        let scale = Vec3::splat(rng.gen_range(0.5..2.5));

        boxes.push(Mat4::from_scale_rotation_translation(
            scale,
            rotation,
            translation,
        ));
    }

    boxes
}

impl Demo1 {
    fn build_scene(&self) -> Scene<LoadedObj> {
        let mut scene = Scene::new();

        let dull = Surface{
            cast_shadow : true,
            material : Material::dull(),
        };

        let shiny = Surface{
            cast_shadow : true,
            material : Material::shiny(),
        };

        // the floor only receives shadows
        scene.add_surface(
            Mat4::from_scale_rotation_translation(
                Vec3::new(60.0, 1.0, 60.0),
                Quat::IDENTITY,
                Vec3::new(0.0, -1.0, 0.0),
            ),
            Surface{
                cast_shadow : false,
                material : Material::dull(),
            },
            self.cube,
        );

        for model in self.boxes.iter() {
            scene.add_surface(*model, dull, self.cube);
        }

        scene.add_surface(
            Mat4::from_scale_rotation_translation(
                Vec3::splat(4.0),
                Quat::from_rotation_y(self.angle),
                Vec3::new(0.0, 2.0, -6.0),
            ),
            shiny,
            self.pyramid,
        );

        scene.set_directional_light(DirectionalLight{
            color : Vec3::new(1.0, 0.95, 0.85),
            ambient_intensity : 0.2,
            direction : Vec3::new(
                self.sun_angle.cos(),
                -1.0,
                self.sun_angle.sin(),
            ),
            diffuse_intensity : 0.6,
        });

        scene.add_point_light(PointLight{
            color : Vec3::new(0.2, 0.4, 1.0),
            ambient_intensity : 0.05,
            position : Vec3::new(
                8.0 * (self.angle * 0.5).cos(),
                1.5,
                8.0 * (self.angle * 0.5).sin(),
            ),
            diffuse_intensity : 0.8,
            constant : 1.0,
            linear : 0.09,
            exponent : 0.032,
            ..Default::default()
        });

        scene.add_point_light(PointLight{
            color : Vec3::new(1.0, 0.3, 0.2),
            ambient_intensity : 0.05,
            position : Vec3::new(-6.0, 2.0, 4.0),
            diffuse_intensity : 0.8,
            constant : 1.0,
            linear : 0.14,
            exponent : 0.07,
            ..Default::default()
        });

        if self.flashlight {
            scene.add_spot_light(SpotLight{
                color : Vec3::ONE,
                ambient_intensity : 0.0,
                position : self.camera.position,
                diffuse_intensity : 1.5,
                constant : 1.0,
                linear : 0.045,
                exponent : 0.0075,
                direction : self.camera.front(),
                edge : (10.0f32).to_radians().cos(),
                ..Default::default()
            });
        }

        scene
    }
}

impl App for Demo1 {
    fn init(ctx : &mut GraphicsContext) -> Self {
        ctx.set_title("demo1 - shadows");

        let (major, minor) = ctx.gl_version();
        println!("OpenGL version: {}.{}", major, minor);

        let prog = match ctx.load_program(
            include_str!("../shaders/phong.vert"),
            include_str!("../shaders/phong.frag"),
        ) {
            Ok(v) => v,
            Err(s) => {
                println!("SHADER ERROR: ");
                println!("{}", s);
                std::process::exit(1);
            }
        };

        let cache = RenderCache::new(ctx);
        let depth_debug = DepthDebug::new(ctx);

        let cube = ctx.load_object(&Obj::cube());
        let pyramid = ctx.load_object(&Obj::pyramid());

        Self{
            prog,
            cache,
            depth_debug,
            cube,
            pyramid,
            boxes : scatter_boxes(40),
            camera : FlyCamera{
                position : Vec3::new(0.0, 3.0, 12.0),
                ..Default::default()
            },
            angle : 0.0,
            show_gui : true,
            show_depth : false,
            flashlight : true,
            sun_angle : PI / 4.0,
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

            if self.input.key_pressed(VirtualKeyCode::H) {
                self.show_gui = !self.show_gui;
            }

            if self.input.key_pressed(VirtualKeyCode::F) {
                self.flashlight = !self.flashlight;
            }
        }

        let now = Instant::now();
        let next_draw = self.time + (Duration::from_secs(1) / 60);

        if is_redraw_event(&event) {
            let delta = (now - self.time).as_secs_f32();
            self.time = now;

            self.angle += delta * PI / 6.0;

            {
                use glutin::event::VirtualKeyCode;

                let input = &self.input;
                let axis = |pos, neg| -> f32 {
                    let mut v = 0.0;
                    if input.key_held(pos) { v += 1.0; }
                    if input.key_held(neg) { v -= 1.0; }
                    v
                };

                self.camera.advance(
                    axis(VirtualKeyCode::W, VirtualKeyCode::S),
                    axis(VirtualKeyCode::D, VirtualKeyCode::A),
                    axis(VirtualKeyCode::E, VirtualKeyCode::C),
                    delta,
                );

                // arrow keys stand in for mouse look
                self.camera.turn(
                    axis(VirtualKeyCode::Right, VirtualKeyCode::Left)
                        * 400.0 * delta,
                    axis(VirtualKeyCode::Down, VirtualKeyCode::Up)
                        * 400.0 * delta,
                );
            }

            ctx.clear(0.05, 0.05, 0.08, 1.0);

            let scene = self.build_scene();
            let camera = self.camera.camera(ctx.aspect());

            ctx.render_scene(
                &mut self.cache,
                &camera,
                &scene,
                &self.prog,
            );

            if self.show_depth {
                self.depth_debug.render(ctx, &self.cache);
            }

            if self.show_gui {
                let show_depth = &mut self.show_depth;
                let flashlight = &mut self.flashlight;
                let sun_angle = &mut self.sun_angle;
                let position = self.camera.position;

                ctx.render_egui(|egui_ctx| {
                    egui::SidePanel::left("demo1_panel").show(
                        egui_ctx,
                        |ui| {
                            ui.heading("shadows");

                            ui.checkbox(show_depth, "depth map");
                            ui.checkbox(flashlight, "flashlight (F)");

                            ui.add(egui::Slider::new(
                                sun_angle,
                                0.0..=(2.0 * PI),
                            ).text("sun angle"));

                            ui.label(format!(
                                "position: {:.1}",
                                position,
                            ));

                            ui.label("WASD moves, arrows look");
                            ui.label("E/C up and down, Q quits, H hides");
                        },
                    );
                });
            }

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
    run::<Demo1>();
}
