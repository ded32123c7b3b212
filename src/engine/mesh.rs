//! Icosphere meshes with a rest/live buffer pair.
//!
//! The rest pose is captured once at construction and never written again;
//! deformation stages write only the live buffer. Keeping the anchor
//! immutable is what stops the elastic deformation from drifting: offsets are
//! re-derived from rest every frame instead of accumulating.

use nannou::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Golden ratio, for the icosahedron seed vertices.
const PHI: f32 = 1.618_034;

/// Seed icosahedron: 12 vertices, 20 faces.
const ICO_VERTICES: [[f32; 3]; 12] = [
    [-1.0, PHI, 0.0],
    [1.0, PHI, 0.0],
    [-1.0, -PHI, 0.0],
    [1.0, -PHI, 0.0],
    [0.0, -1.0, PHI],
    [0.0, 1.0, PHI],
    [0.0, -1.0, -PHI],
    [0.0, 1.0, -PHI],
    [PHI, 0.0, -1.0],
    [PHI, 0.0, 1.0],
    [-PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
];

const ICO_FACES: [[u32; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// A wireframe sphere mesh: immutable rest pose, mutable live buffer,
/// unit normals and the unique edge list for drawing.
pub struct Mesh {
    rest: Vec<Vec3>,
    live: Vec<Vec3>,
    normals: Vec<Vec3>,
    edges: Vec<(u32, u32)>,
    dirty: bool,
}

impl Mesh {
    /// Build an icosphere of the given radius, subdivided `subdivisions`
    /// times (0 = the raw 12-vertex icosahedron).
    pub fn icosphere(radius: f32, subdivisions: u32) -> Self {
        let mut vertices: Vec<Vec3> = ICO_VERTICES
            .iter()
            .map(|v| vec3(v[0], v[1], v[2]).normalize())
            .collect();
        let mut faces: Vec<[u32; 3]> = ICO_FACES.to_vec();

        for _ in 0..subdivisions {
            let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
            let mut next_faces = Vec::with_capacity(faces.len() * 4);

            let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Vec3>| -> u32 {
                let key = (a.min(b), a.max(b));
                *midpoints.entry(key).or_insert_with(|| {
                    let m = ((vertices[a as usize] + vertices[b as usize]) * 0.5).normalize();
                    vertices.push(m);
                    (vertices.len() - 1) as u32
                })
            };

            for [a, b, c] in faces {
                let ab = midpoint(a, b, &mut vertices);
                let bc = midpoint(b, c, &mut vertices);
                let ca = midpoint(c, a, &mut vertices);
                next_faces.push([a, ab, ca]);
                next_faces.push([b, bc, ab]);
                next_faces.push([c, ca, bc]);
                next_faces.push([ab, bc, ca]);
            }
            faces = next_faces;
        }

        // Unique undirected edges, ordered for deterministic draw order
        let mut edge_set = BTreeSet::new();
        for [a, b, c] in &faces {
            for (x, y) in [(a, b), (b, c), (c, a)] {
                edge_set.insert((*x.min(y), *x.max(y)));
            }
        }

        // For a sphere the unit position doubles as the surface normal
        let normals = vertices.clone();
        let rest: Vec<Vec3> = vertices.iter().map(|v| *v * radius).collect();
        let live = rest.clone();

        Self {
            rest,
            live,
            normals,
            edges: edge_set.into_iter().collect(),
            dirty: false,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.rest.len()
    }

    /// The immutable rest pose.
    pub fn rest(&self) -> &[Vec3] {
        &self.rest
    }

    /// The live (deformed) positions.
    pub fn live(&self) -> &[Vec3] {
        &self.live
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Write access for deformation stages; marks the buffer dirty for upload.
    pub fn live_mut(&mut self) -> &mut [Vec3] {
        self.dirty = true;
        &mut self.live
    }

    /// Per-vertex map from the rest pose into the live buffer:
    /// `live[i] = f(i, rest[i], normal[i])`. No allocation; marks dirty.
    pub fn map_rest_to_live(&mut self, mut f: impl FnMut(usize, Vec3, Vec3) -> Vec3) {
        for i in 0..self.rest.len() {
            self.live[i] = f(i, self.rest[i], self.normals[i]);
        }
        self.dirty = true;
    }

    /// True if the live buffer changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}
