use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};
use gltf::buffer;
use itertools::izip;

use crate::math::bounds::AABB;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
    /// Bounds of all primitives in model space.
    pub bounds: AABB,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn new(name: impl Into<String>, primitives: Vec<ModelPrimitive>) -> Model {
        let bounds = AABB::from_points(
            primitives
                .iter()
                .flat_map(|primitive| primitive.vertices.iter().map(|v| v.position)),
        );

        Model {
            name: name.into(),
            primitives,
            bounds,
        }
    }

    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let name = name.into();
        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of {}: unsupported mode {:?}",
                    primitive.index(),
                    name,
                    primitive.mode()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d[..]));

            let positions = reader
                .read_positions()
                .ok_or_else(|| {
                    anyhow::anyhow!("Primitive {} of {} has no positions", primitive.index(), name)
                })?
                .map(Vec3::from)
                .collect::<Vec<Vec3>>();

            let indices = match reader.read_indices() {
                Some(index_reader) => index_reader.into_u32().collect::<Vec<u32>>(),
                None => (0..positions.len() as u32).collect(),
            };

            if let Some(&out_of_range) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                return Err(anyhow::anyhow!(
                    "Primitive {} of {} references vertex {} of {}",
                    primitive.index(),
                    name,
                    out_of_range,
                    positions.len()
                ));
            }

            let normals = match reader.read_normals() {
                Some(normal_reader) => normal_reader.map(Vec3::from).collect::<Vec<Vec3>>(),
                None => generate_normals(&positions, &indices),
            };

            let base_color = Vec4::from(primitive.material().pbr_metallic_roughness().base_color_factor());
            let colors = match reader.read_colors(0) {
                Some(color_reader) => color_reader
                    .into_rgba_f32()
                    .map(|rgba| (Vec4::from(rgba) * base_color).xyz())
                    .collect::<Vec<Vec3>>(),
                None => vec![base_color.xyz(); positions.len()],
            };

            for (attribute, count) in [("normals", normals.len()), ("colors", colors.len())] {
                if count != positions.len() {
                    return Err(anyhow::anyhow!(
                        "Primitive {} of {} has {} {} for {} positions",
                        primitive.index(),
                        name,
                        count,
                        attribute,
                        positions.len()
                    ));
                }
            }

            let vertices = izip!(positions, normals, colors)
                .map(|(position, normal, color)| Vertex {
                    position,
                    normal,
                    color,
                })
                .collect::<Vec<Vertex>>();

            primitives.push(ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
            });
        }

        if primitives.is_empty() {
            log::warn!("Mesh {} has no triangle primitives, nothing will be drawn", name);
        }

        Ok(Model::new(name, primitives))
    }

    /// Axis-aligned box centered on the origin.
    pub fn cuboid(name: impl Into<String>, width: f32, height: f32, depth: f32, color: Vec3) -> Model {
        let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);
        let mut builder = PrimitiveBuilder::new(color);

        builder.quad(Vec3::X * hx, Vec3::NEG_Z * hz, Vec3::Y * hy);
        builder.quad(Vec3::NEG_X * hx, Vec3::Z * hz, Vec3::Y * hy);
        builder.quad(Vec3::Y * hy, Vec3::X * hx, Vec3::NEG_Z * hz);
        builder.quad(Vec3::NEG_Y * hy, Vec3::X * hx, Vec3::Z * hz);
        builder.quad(Vec3::Z * hz, Vec3::X * hx, Vec3::Y * hy);
        builder.quad(Vec3::NEG_Z * hz, Vec3::NEG_X * hx, Vec3::Y * hy);

        Model::new(name, vec![builder.build(0)])
    }

    /// Plane in the XY plane facing +Z, centered on the origin.
    pub fn plane(name: impl Into<String>, width: f32, height: f32, color: Vec3) -> Model {
        let mut builder = PrimitiveBuilder::new(color);
        builder.quad(Vec3::ZERO, Vec3::X * width * 0.5, Vec3::Y * height * 0.5);

        Model::new(name, vec![builder.build(0)])
    }
}

struct PrimitiveBuilder {
    color: Vec3,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl PrimitiveBuilder {
    fn new(color: Vec3) -> Self {
        Self {
            color,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    // The face normal is u × v, so the quad winds counter-clockwise seen from the front.
    fn quad(&mut self, center: Vec3, u: Vec3, v: Vec3) {
        let normal = u.cross(v).normalize();
        let base = self.vertices.len() as u32;

        for position in [center - u - v, center + u - v, center + u + v, center - u + v] {
            self.vertices.push(Vertex {
                position,
                normal,
                color: self.color,
            });
        }

        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn build(self, index: usize) -> ModelPrimitive {
        ModelPrimitive {
            index,
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

/// Area-weighted vertex normals for meshes that ship without them.
fn generate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let face_normal = (positions[b] - positions[a]).cross(positions[c] - positions[a]);

        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }

    normals
        .into_iter()
        .map(|normal| normal.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}
