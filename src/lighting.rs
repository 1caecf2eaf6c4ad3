//! Light and material parameters.
//!
//! Each struct knows how to write itself into a shader under a struct-typed uniform, building the
//! member names at runtime (`dirLight.direction`, `pointLights[1].quadratic`, ...). Members a
//! program does not declare are skipped silently, so simpler shaders can ignore e.g. the specular
//! terms.

use glam::Vec3;

use crate::{abs::ShaderProgram, camera::Camera};

/// Maximum number of point lights the bundled shaders declare.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Returns `base.field`.
pub fn uniform_field(base: &str, field: &str) -> String {
    format!("{base}.{field}")
}

/// Returns `array[index]`.
pub fn uniform_index(array: &str, index: usize) -> String {
    format!("{array}[{index}]")
}

/// Ambient, diffuse and specular colour of a light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightColor {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl LightColor {
    /// A white light with the given ambient and diffuse strengths and full specular.
    pub fn white(ambient: f32, diffuse: f32) -> Self {
        Self {
            ambient: Vec3::splat(ambient),
            diffuse: Vec3::splat(diffuse),
            specular: Vec3::ONE,
        }
    }

    fn apply(&self, program: &ShaderProgram, name: &str) {
        program.set_uniform(&uniform_field(name, "ambient"), self.ambient);
        program.set_uniform(&uniform_field(name, "diffuse"), self.diffuse);
        program.set_uniform(&uniform_field(name, "specular"), self.specular);
    }
}

/// Distance falloff `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    /// Covers roughly 50 units.
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl Attenuation {
    /// Light intensity factor at `distance`.
    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    fn apply(&self, program: &ShaderProgram, name: &str) {
        program.set_uniform(&uniform_field(name, "constant"), self.constant);
        program.set_uniform(&uniform_field(name, "linear"), self.linear);
        program.set_uniform(&uniform_field(name, "quadratic"), self.quadratic);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: LightColor,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.2, -1.0, -0.3),
            color: LightColor {
                ambient: Vec3::splat(0.05),
                diffuse: Vec3::splat(0.4),
                specular: Vec3::splat(0.5),
            },
        }
    }
}

impl DirectionalLight {
    pub fn apply(&self, program: &ShaderProgram, name: &str) {
        program.set_uniform(&uniform_field(name, "direction"), self.direction);
        self.color.apply(program, name);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: LightColor,
    pub attenuation: Attenuation,
}

impl PointLight {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            color: LightColor::white(0.05, 0.8),
            attenuation: Attenuation::default(),
        }
    }

    pub fn apply(&self, program: &ShaderProgram, name: &str) {
        program.set_uniform(&uniform_field(name, "position"), self.position);
        self.color.apply(program, name);
        self.attenuation.apply(program, name);
    }
}

/// A cone light with a soft edge between `cut_off` and `outer_cut_off` (degrees).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub color: LightColor,
    pub attenuation: Attenuation,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            cut_off: 12.5,
            outer_cut_off: 15.0,
            color: LightColor::white(0.0, 1.0),
            attenuation: Attenuation::default(),
        }
    }
}

impl SpotLight {
    /// Places the light at the camera, pointing where it looks.
    pub fn follow(&mut self, camera: &Camera) {
        self.position = camera.position;
        self.direction = camera.basis().forward;
    }

    /// Writes the light. Cut-off angles are sent as cosines.
    pub fn apply(&self, program: &ShaderProgram, name: &str) {
        program.set_uniform(&uniform_field(name, "position"), self.position);
        program.set_uniform(&uniform_field(name, "direction"), self.direction);
        program.set_uniform(
            &uniform_field(name, "cutOff"),
            self.cut_off.to_radians().cos(),
        );
        program.set_uniform(
            &uniform_field(name, "outerCutOff"),
            self.outer_cut_off.to_radians().cos(),
        );
        self.color.apply(program, name);
        self.attenuation.apply(program, name);
    }
}

/// Non-texture material parameters. Textures are bound by the mesh itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self { shininess: 32.0 }
    }
}

impl Material {
    pub fn apply(&self, program: &ShaderProgram, name: &str) {
        program.set_uniform(&uniform_field(name, "shininess"), self.shininess);
    }
}

/// All lights of a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneLights {
    pub directional: DirectionalLight,
    pub points: Vec<PointLight>,
    pub spot: SpotLight,
    pub spot_enabled: bool,
}

impl Default for SceneLights {
    fn default() -> Self {
        Self {
            directional: DirectionalLight::default(),
            points: vec![
                PointLight::new(Vec3::new(0.7, 0.2, 2.0)),
                PointLight::new(Vec3::new(2.3, -3.3, -4.0)),
                PointLight::new(Vec3::new(-4.0, 2.0, -12.0)),
                PointLight::new(Vec3::new(0.0, 0.0, -3.0)),
            ],
            spot: SpotLight::default(),
            spot_enabled: true,
        }
    }
}

impl SceneLights {
    /// Writes every light. Point lights beyond [`MAX_POINT_LIGHTS`] are dropped with a warning.
    pub fn apply(&self, program: &ShaderProgram) {
        self.directional.apply(program, "dirLight");

        if self.points.len() > MAX_POINT_LIGHTS {
            log::warn!(
                "{} point lights given, only the first {} are used",
                self.points.len(),
                MAX_POINT_LIGHTS
            );
        }
        let count = self.points.len().min(MAX_POINT_LIGHTS);
        for (i, light) in self.points.iter().take(count).enumerate() {
            light.apply(program, &uniform_index("pointLights", i));
        }
        program.set_uniform("pointLightCount", count as i32);

        self.spot.apply(program, "spotLight");
        program.set_uniform("spotLightEnabled", self.spot_enabled);
    }
}
