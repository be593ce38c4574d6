use glam::Vec3;

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Converts a 0xRRGGBB sRGB color to linear RGB.
pub fn srgb_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };

    Vec3::new(channel(16), channel(8), channel(0))
}

#[derive(Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(hex: u32, intensity: f32) -> Self {
        Self {
            color: srgb_hex(hex),
            intensity,
        }
    }
}

/// Light shining from `position` towards the origin.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    pub fn new(hex: u32, intensity: f32, position: Vec3) -> Self {
        Self {
            color: srgb_hex(hex),
            intensity,
            position,
        }
    }

    /// Unit vector from a lit surface towards the light.
    pub fn direction_to_light(&self) -> Vec3 {
        self.position.try_normalize().unwrap_or(Vec3::Y)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lights {
    pub ambient: Vec<AmbientLight>,
    pub directional: Vec<DirectionalLight>,
}

impl Lights {
    pub fn add_ambient(&mut self, light: AmbientLight) {
        self.ambient.push(light);
    }

    pub fn add_directional(&mut self, light: DirectionalLight) {
        if self.directional.len() >= MAX_DIRECTIONAL_LIGHTS {
            log::warn!(
                "Ignoring directional light, at most {} are supported",
                MAX_DIRECTIONAL_LIGHTS
            );
            return;
        }
        self.directional.push(light);
    }

    pub fn ambient_radiance(&self) -> Vec3 {
        self.ambient
            .iter()
            .map(|light| light.color * light.intensity)
            .sum()
    }
}
