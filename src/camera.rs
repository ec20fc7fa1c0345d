use glam::*;

#[derive(Debug)]
pub struct Camera {
    pub position : Vec3,
    pub forward : Vec3,
    pub up : Vec3,
    pub fov_y : f32,
    pub aspect : f32,
    pub near : f32,
    pub far : f32,
}

impl Camera {
    pub fn projection(&self) -> glam::Mat4 {
        glam::Mat4::perspective_rh_gl(
            self.fov_y,
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view(&self) -> glam::Mat4 {
        glam::Mat4::look_at_rh(
            self.position,
            self.forward,
            self.up,
        )
    }
}

/// Yaw/pitch fly camera. Angles are radians; yaw 0 looks down +X,
/// yaw -pi/2 looks down -Z.
#[derive(Debug)]
pub struct FlyCamera {
    pub position : Vec3,
    pub world_up : Vec3,
    pub yaw : f32,
    pub pitch : f32,
    pub speed : f32,
    pub turn_speed : f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self{
            position : Vec3::ZERO,
            world_up : Vec3::Y,
            yaw : -std::f32::consts::FRAC_PI_2,
            pitch : 0.0,
            speed : 5.0,
            turn_speed : 1.0,
        }
    }
}

impl FlyCamera {
    const MAX_PITCH : f32 = 89.0 * std::f32::consts::PI / 180.0;

    pub fn front(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        ).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(self.world_up).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.front()).normalize()
    }

    /// Moves along the camera axes; `forward`/`right`/`lift` are signed
    /// key states, scaled by speed and frame time.
    pub fn advance(
        &mut self,
        forward : f32,
        right : f32,
        lift : f32,
        delta_time : f32,
    ) {
        let velocity = self.speed * delta_time;

        self.position += self.front() * (forward * velocity);
        self.position += self.right() * (right * velocity);
        self.position += self.up() * (lift * velocity);
    }

    /// Applies a mouse delta, clamping pitch short of the poles.
    pub fn turn(&mut self, dx : f32, dy : f32) {
        self.yaw += dx * 0.003 * self.turn_speed;
        self.pitch -= dy * 0.003 * self.turn_speed;
        self.pitch = self.pitch.clamp(
            -Self::MAX_PITCH,
            Self::MAX_PITCH,
        );
    }

    pub fn camera(&self, aspect : f32) -> Camera {
        Camera{
            position : self.position,
            forward : self.position + self.front(),
            up : self.up(),
            fov_y : std::f32::consts::FRAC_PI_3,
            aspect,
            near : 0.1,
            far : 200.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_near(got : Vec3, want : Vec3) {
        assert!(
            (got - want).length() < 1e-5,
            "got {:?}, want {:?}",
            got,
            want,
        );
    }

    #[test]
    fn front_follows_yaw() {
        let mut cam = FlyCamera::default();

        cam.yaw = 0.0;
        assert_near(cam.front(), Vec3::X);

        cam.yaw = -FRAC_PI_2;
        assert_near(cam.front(), -Vec3::Z);
    }

    #[test]
    fn pitch_clamps_short_of_vertical() {
        let mut cam = FlyCamera::default();

        for _ in 0..1000 {
            cam.turn(0.0, -100.0);
        }

        assert!(cam.pitch < FRAC_PI_2);
        assert!(cam.front().is_finite());

        // right axis stays usable at max pitch
        assert!(cam.right().length() > 0.9);
    }

    #[test]
    fn advance_moves_along_front() {
        let mut cam = FlyCamera{
            yaw : 0.0,
            speed : 2.0,
            ..Default::default()
        };

        cam.advance(1.0, 0.0, 0.0, 0.5);

        assert_near(cam.position, Vec3::X);
    }
}
