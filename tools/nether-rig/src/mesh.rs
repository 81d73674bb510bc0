//! Mesh helpers for export
//!
//! Copies an object's mesh for writing, optionally evaluating its modifier
//! stack and triangulating it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::RigError;
use crate::scene::{ModifierKind, Object, ObjectData};

/// Which modifier visibility is evaluated for an exported mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeshType {
    /// Modifiers enabled in the viewport
    #[default]
    View,
    /// Modifiers enabled for rendering
    Render,
}

/// A named UV layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UvLayer {
    pub name: String,
    pub uvs: Vec<[f32; 2]>,
}

/// Polygon mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Vertex indices per polygon, counter-clockwise
    pub polygons: Vec<Vec<u32>>,
    pub uv_layers: Vec<UvLayer>,
    pub active_uv_layer: Option<usize>,
    pub smooth: bool,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.polygons
            .iter()
            .map(|p| p.len().saturating_sub(2))
            .sum()
    }

    pub fn is_triangulated(&self) -> bool {
        self.polygons.iter().all(|p| p.len() == 3)
    }
}

/// Index of the active UV layer, if the mesh has one
pub fn active_uv_layer(mesh: &Mesh) -> Option<usize> {
    mesh.active_uv_layer.filter(|&i| i < mesh.uv_layers.len())
}

/// Source array of an interchange file, stored as single or double precision
#[derive(Debug, Clone, PartialEq)]
pub enum FloatSource {
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl FloatSource {
    pub fn len(&self) -> usize {
        match self {
            FloatSource::Float(v) => v.len(),
            FloatSource::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index` as `f32`, or 0.0 past the end
    pub fn value(&self, index: usize) -> f32 {
        match self {
            FloatSource::Float(v) => v.get(index).copied().unwrap_or(0.0),
            FloatSource::Double(v) => v.get(index).map(|&d| d as f32).unwrap_or(0.0),
        }
    }
}

/// Polygon normal scaled by twice its area (sum of edge cross products)
fn polygon_normal(points: &[Vec3]) -> Vec3 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .fold(Vec3::ZERO, |normal, (a, b)| normal + a.cross(*b))
}

/// Turn at `b` going a -> b -> c, positive when counter-clockwise around `normal`
fn turn(a: Vec3, b: Vec3, c: Vec3, normal: Vec3) -> f32 {
    (b - a).cross(c - b).dot(normal)
}

fn in_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3, normal: Vec3) -> bool {
    (b - a).cross(p - a).dot(normal) >= 0.0
        && (c - b).cross(p - b).dot(normal) >= 0.0
        && (a - c).cross(p - c).dot(normal) >= 0.0
}

/// Cut a quad along its shorter diagonal, unless that diagonal leaves the quad
fn split_quad(quad: [u32; 4], points: [Vec3; 4], triangles: &mut Vec<Vec<u32>>) {
    let [a, b, c, d] = quad;
    let [pa, pb, pc, pd] = points;
    let normal = polygon_normal(&points);

    let ac_valid = turn(pa, pb, pc, normal) > 0.0 && turn(pc, pd, pa, normal) > 0.0;
    let bd_valid = turn(pd, pa, pb, normal) > 0.0 && turn(pb, pc, pd, normal) > 0.0;
    let ac_shorter = pa.distance_squared(pc) <= pb.distance_squared(pd);

    if (ac_shorter && ac_valid) || !bd_valid {
        triangles.push(vec![a, b, c]);
        triangles.push(vec![a, c, d]);
    } else {
        triangles.push(vec![a, b, d]);
        triangles.push(vec![b, c, d]);
    }
}

/// Previous, current and next entry of a closed index ring
fn corner(ring: &[usize], i: usize) -> (usize, usize, usize) {
    let n = ring.len();
    (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n])
}

/// Ear clipping in the polygon's plane
///
/// Falls back to a fan from the first remaining vertex when the polygon has
/// no area or no ear can be found (self-intersecting input).
fn clip_ears(polygon: &[u32], points: &[Vec3], triangles: &mut Vec<Vec<u32>>) {
    let normal = polygon_normal(points);
    let mut remaining: Vec<usize> = (0..polygon.len()).collect();

    if normal.length_squared() > f32::EPSILON {
        while remaining.len() > 3 {
            let ear = (0..remaining.len()).find(|&i| {
                let (prev, cur, next) = corner(&remaining, i);
                let (a, b, c) = (points[prev], points[cur], points[next]);
                turn(a, b, c, normal) > 0.0
                    && remaining
                        .iter()
                        .filter(|&&other| other != prev && other != cur && other != next)
                        .all(|&other| !in_triangle(points[other], a, b, c, normal))
            });
            let Some(i) = ear else {
                break;
            };

            let (prev, cur, next) = corner(&remaining, i);
            triangles.push(vec![polygon[prev], polygon[cur], polygon[next]]);
            remaining.remove(i);
        }
    }

    if let [first, rest @ ..] = remaining.as_slice() {
        for pair in rest.windows(2) {
            triangles.push(vec![polygon[*first], polygon[pair[0]], polygon[pair[1]]]);
        }
    }
}

/// Split every polygon into triangles
///
/// Quads are cut along their shorter diagonal (the other one when the quad is
/// concave and the shorter diagonal lies outside it). Larger polygons are
/// ear clipped, so concave outlines stay covered with correctly wound
/// triangles. Polygons with fewer than three vertices are dropped.
pub fn triangulate(mesh: &mut Mesh) {
    let positions = &mesh.positions;
    let position = |i: u32| positions.get(i as usize).copied().unwrap_or(Vec3::ZERO);

    let mut triangles = Vec::with_capacity(mesh.triangle_count());
    for polygon in &mesh.polygons {
        match polygon.as_slice() {
            [a, b, c] => triangles.push(vec![*a, *b, *c]),
            &[a, b, c, d] => split_quad(
                [a, b, c, d],
                [position(a), position(b), position(c), position(d)],
                &mut triangles,
            ),
            ngon if ngon.len() > 4 => {
                let points: Vec<Vec3> = ngon.iter().map(|&i| position(i)).collect();
                clip_ears(ngon, &points, &mut triangles);
            }
            _ => {}
        }
    }

    tracing::debug!(
        "Triangulated mesh '{}': {} polygons -> {} triangles",
        mesh.name,
        mesh.polygons.len(),
        triangles.len()
    );
    mesh.polygons = triangles;
}

/// Copy an object's mesh for export
///
/// With `apply_modifiers` the modifiers enabled for `mesh_type` are evaluated
/// in stack order. Only modifiers that change topology without needing a pose
/// are evaluated here; armature modifiers are left to the skinning export.
pub fn mesh_copy(
    object: &Object,
    mesh_type: MeshType,
    apply_modifiers: bool,
    triangulate_mesh: bool,
) -> Result<Mesh, RigError> {
    let ObjectData::Mesh(source) = &object.data else {
        return Err(RigError::NotAMesh(object.name.clone()));
    };

    let mut mesh = source.clone();

    if apply_modifiers {
        for modifier in object
            .modifiers
            .iter()
            .filter(|m| m.is_enabled(mesh_type))
        {
            match modifier.kind {
                ModifierKind::Triangulate => triangulate(&mut mesh),
                ModifierKind::Armature { .. } => {}
            }
        }
    }

    if triangulate_mesh && !mesh.is_triangulated() {
        triangulate(&mut mesh);
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Modifier, ObjectKind, Scene};

    fn quad(positions: [Vec3; 4]) -> Mesh {
        Mesh {
            name: "Quad".to_string(),
            positions: positions.to_vec(),
            polygons: vec![vec![0, 1, 2, 3]],
            ..Default::default()
        }
    }

    #[test]
    fn test_quad_splits_along_shorter_diagonal() {
        // 0-2 is the short diagonal
        let mut mesh = quad([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 2.0, 0.0),
        ]);
        triangulate(&mut mesh);
        assert_eq!(mesh.polygons, vec![vec![0, 1, 2], vec![0, 2, 3]]);

        // 1-3 is the short diagonal
        let mut mesh = quad([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(4.0, 4.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]);
        triangulate(&mut mesh);
        assert_eq!(mesh.polygons, vec![vec![0, 1, 3], vec![1, 2, 3]]);
    }

    #[test]
    fn test_concave_quad_uses_inner_diagonal() {
        // Dart with its reflex corner at 1; 0-2 is shorter but runs outside
        let mut mesh = quad([
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 5.0, 0.0),
        ]);
        triangulate(&mut mesh);
        assert_eq!(mesh.polygons, vec![vec![0, 1, 3], vec![1, 2, 3]]);
    }

    #[test]
    fn test_concave_hexagon_is_ear_clipped() {
        // L shape, counter-clockwise, starting next to the reflex corner at 1
        let mut mesh = Mesh {
            positions: vec![
                Vec3::new(2.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 2.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
            ],
            polygons: vec![vec![0, 1, 2, 3, 4, 5]],
            ..Default::default()
        };
        triangulate(&mut mesh);
        assert_eq!(mesh.polygons.len(), 4);

        let areas: Vec<f32> = mesh
            .polygons
            .iter()
            .map(|t| {
                let [a, b, c] = [0, 1, 2].map(|k| mesh.positions[t[k] as usize]);
                (b - a).cross(c - a).z * 0.5
            })
            .collect();
        assert!(areas.iter().all(|&area| area > 0.0), "flipped: {:?}", areas);
        assert!((areas.iter().sum::<f32>() - 3.0).abs() < 1e-5);

        // Every vertex is still used
        let mut used: Vec<u32> = mesh.polygons.concat();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_flat_ngons_are_fanned_and_degenerates_dropped() {
        let mut mesh = Mesh {
            positions: vec![Vec3::ZERO; 5],
            polygons: vec![vec![0, 1, 2, 3, 4], vec![0, 1], vec![2, 3, 4]],
            ..Default::default()
        };
        assert_eq!(mesh.triangle_count(), 4);
        triangulate(&mut mesh);
        assert_eq!(
            mesh.polygons,
            vec![vec![0, 1, 2], vec![0, 2, 3], vec![0, 3, 4], vec![2, 3, 4]]
        );
        assert!(mesh.is_triangulated());
    }

    #[test]
    fn test_float_source_values() {
        let floats = FloatSource::Float(vec![1.0, 2.5]);
        assert_eq!(floats.value(1), 2.5);
        assert_eq!(floats.value(2), 0.0);

        let doubles = FloatSource::Double(vec![0.25]);
        assert_eq!(doubles.value(0), 0.25);
        assert_eq!(doubles.value(9), 0.0);
        assert_eq!(doubles.len(), 1);
        assert!(FloatSource::Float(Vec::new()).is_empty());
    }

    #[test]
    fn test_active_uv_layer() {
        let mut mesh = Mesh::new("Uv");
        assert_eq!(active_uv_layer(&mesh), None);
        mesh.uv_layers.push(UvLayer::default());
        mesh.uv_layers.push(UvLayer::default());
        mesh.active_uv_layer = Some(1);
        assert_eq!(active_uv_layer(&mesh), Some(1));
        mesh.active_uv_layer = Some(5);
        assert_eq!(active_uv_layer(&mesh), None);
    }

    #[test]
    fn test_mesh_copy_respects_modifier_visibility() {
        let mut scene = Scene::new();
        let id = scene.add_object(ObjectKind::Mesh, "Plane");
        let object = scene.object_mut(id);
        if let ObjectData::Mesh(mesh) = &mut object.data {
            mesh.positions = vec![Vec3::ZERO, Vec3::X, Vec3::X + Vec3::Y, Vec3::Y];
            mesh.polygons = vec![vec![0, 1, 2, 3]];
            mesh.smooth = true;
        }
        object.modifiers.push(Modifier {
            kind: ModifierKind::Triangulate,
            show_viewport: false,
            show_render: true,
        });
        let object = scene.object(id);

        let view = mesh_copy(object, MeshType::View, true, false).unwrap();
        assert_eq!(view.polygons.len(), 1);
        assert!(view.smooth);

        let render = mesh_copy(object, MeshType::Render, true, false).unwrap();
        assert_eq!(render.polygons.len(), 2);

        let raw = mesh_copy(object, MeshType::Render, false, false).unwrap();
        assert_eq!(raw.polygons.len(), 1);

        let forced = mesh_copy(object, MeshType::View, false, true).unwrap();
        assert!(forced.is_triangulated());

        // The source mesh is untouched
        let ObjectData::Mesh(source) = &scene.object(id).data else {
            panic!("expected mesh data");
        };
        assert_eq!(source.polygons.len(), 1);
    }

    #[test]
    fn test_mesh_copy_requires_mesh_data() {
        let mut scene = Scene::new();
        let id = scene.add_object(ObjectKind::Empty, "Empty");
        assert_eq!(
            mesh_copy(scene.object(id), MeshType::View, false, true),
            Err(RigError::NotAMesh("Empty".to_string()))
        );
    }
}
