//! In-memory scene representation produced by a scene parser and consumed by
//! the import pipeline.
//!
//! A [`SceneModel`] is a list of LODs (each a list of meshes), a skeleton, the
//! scene node hierarchy, a material slot table and, for animation imports, a
//! list of animation clips. Every [`Mesh::material_slot_index`] indexes into
//! [`SceneModel::materials`].

use bon::Builder;

pub type Float2 = [f32; 2];
pub type Float3 = [f32; 3];
pub type Quaternion = [f32; 4];

/// Screen size falloff used when LOD transitions are computed automatically.
const AUTO_LOD_SCREEN_SIZE_BASE: f32 = 0.5;

/// Opaque reference to another asset (e.g. a material). Zero means "none".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

impl AssetId {
    pub const NONE: AssetId = AssetId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Which shadow passes a material slot participates in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShadowsCastingMode {
    None = 0,
    DynamicOnly = 1,
    StaticOnly = 2,
    #[default]
    All = 3,
}

impl ShadowsCastingMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::DynamicOnly),
            2 => Some(Self::StaticOnly),
            3 => Some(Self::All),
            _ => None,
        }
    }
}

/// An indexed material assignment shared by one or more meshes.
#[derive(Builder, Clone, Debug, Default, PartialEq)]
pub struct MaterialSlot {
    #[builder(into)]
    pub name: String,
    #[builder(default)]
    pub shadows_mode: ShadowsCastingMode,
    #[builder(default)]
    pub material: AssetId,
}

/// Axis-aligned bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Float3,
    pub max: Float3,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        min: [0.0; 3],
        max: [0.0; 3],
    };

    /// Bounds of a point set, or `None` when there are no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Float3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut bounds = BoundingBox {
            min: first,
            max: first,
        };
        for p in points {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: &Float3) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        self.extend(&other.min);
        self.extend(&other.max);
    }

    pub fn size(&self) -> Float3 {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> Float3 {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Radius of the sphere enclosing the box, centered on the box center.
    pub fn bounding_radius(&self) -> f32 {
        let [x, y, z] = self.size();
        (x * x + y * y + z * z).sqrt() * 0.5
    }
}

/// A single mesh fragment. Several meshes may share a name (one per material).
#[derive(Builder, Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    #[builder(into)]
    pub name: String,
    #[builder(default)]
    pub material_slot_index: usize,
    #[builder(default)]
    pub positions: Vec<Float3>,
    #[builder(default)]
    pub normals: Vec<Float3>,
    #[builder(default)]
    pub uvs: Vec<Float2>,
    /// Per-vertex lightmap coordinates, normalized to [0,1]² per mesh until
    /// the atlas packer moves them into a shared chart.
    #[builder(default)]
    pub lightmap_uvs: Vec<Float2>,
    /// Triangle list.
    #[builder(default)]
    pub indices: Vec<u32>,
    #[builder(default)]
    pub blend_indices: Vec<[u16; 4]>,
    #[builder(default)]
    pub blend_weights: Vec<[f32; 4]>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate the triangles whose indices all reference existing vertices.
    pub fn triangles(&self) -> impl Iterator<Item = [Float3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }

    /// Total surface area of all triangles.
    pub fn triangles_area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| length(cross(sub(b, a), sub(c, a))) * 0.5)
            .sum()
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.positions).unwrap_or(BoundingBox::EMPTY)
    }
}

/// One level of detail: a complete mesh set at a given simplification level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lod {
    pub meshes: Vec<Mesh>,
    pub screen_size: f32,
}

impl Lod {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self {
            meshes,
            screen_size: 1.0,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        let mut iter = self.meshes.iter().filter(|m| !m.positions.is_empty());
        let Some(first) = iter.next() else {
            return BoundingBox::EMPTY;
        };
        let mut bounds = first.bounds();
        for mesh in iter {
            bounds.merge(&mesh.bounds());
        }
        bounds
    }
}

/// Local transform of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Float3,
    pub orientation: Quaternion,
    pub scale: Float3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

/// A node of the imported scene hierarchy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub parent_index: Option<usize>,
    pub local_transform: Transform,
}

/// A bone binding a skeleton node to the skinned vertices that reference it.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub parent_index: Option<usize>,
    pub node_index: usize,
    pub local_transform: Transform,
    /// Row-major offset (inverse bind) matrix.
    pub offset_matrix: [f32; 16],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    pub nodes: Vec<Node>,
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.bones.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

/// Keyframed transform tracks for a single node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeAnimation {
    pub node_name: String,
    pub positions: Vec<Keyframe<Float3>>,
    pub rotations: Vec<Keyframe<Quaternion>>,
    pub scales: Vec<Keyframe<Float3>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animation {
    pub name: String,
    /// Clip length in frames.
    pub duration: f64,
    pub frames_per_second: f64,
    pub channels: Vec<NodeAnimation>,
}

/// A parsed scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneModel {
    pub lods: Vec<Lod>,
    pub skeleton: Skeleton,
    pub nodes: Vec<Node>,
    pub materials: Vec<MaterialSlot>,
    pub animations: Vec<Animation>,
}

impl SceneModel {
    /// True when there is no LOD 0 or LOD 0 holds no meshes.
    pub fn has_no_meshes(&self) -> bool {
        self.lods.first().is_none_or(|lod| lod.meshes.is_empty())
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.lods.iter().flat_map(|lod| lod.meshes.iter())
    }

    pub fn meshes_mut(&mut self) -> impl Iterator<Item = &mut Mesh> {
        self.lods.iter_mut().flat_map(|lod| lod.meshes.iter_mut())
    }

    /// Assign LOD transition screen sizes: `1.0` for LOD 0, halving per level.
    pub fn calculate_lod_screen_sizes(&mut self) {
        for (lod_index, lod) in self.lods.iter_mut().enumerate() {
            lod.screen_size = AUTO_LOD_SCREEN_SIZE_BASE.powi(lod_index as i32);
        }
    }

    /// Smallest screen size among all LODs (the size below which nothing is drawn).
    pub fn min_screen_size(&self) -> f32 {
        self.lods
            .iter()
            .map(|lod| lod.screen_size)
            .fold(f32::INFINITY, f32::min)
            .min(1.0)
            .max(0.0)
    }
}

pub(crate) fn sub(a: Float3, b: Float3) -> Float3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn dot(a: Float3, b: Float3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: Float3, b: Float3) -> Float3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn length(a: Float3) -> f32 {
    dot(a, a).sqrt()
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    /// Unit-square quad in the XY plane, scaled by `size`, with lightmap UVs
    /// covering the full [0,1]² chart.
    pub fn quad(name: &str, material_slot_index: usize, size: f32) -> Mesh {
        Mesh::builder()
            .name(name)
            .material_slot_index(material_slot_index)
            .positions(vec![
                [0.0, 0.0, 0.0],
                [size, 0.0, 0.0],
                [size, size, 0.0],
                [0.0, size, 0.0],
            ])
            .normals(vec![[0.0, 0.0, 1.0]; 4])
            .uvs(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
            .lightmap_uvs(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
            .indices(vec![0, 1, 2, 0, 2, 3])
            .build()
    }

    pub fn slot(name: &str) -> MaterialSlot {
        MaterialSlot::builder().name(name).build()
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::quad;
    use super::*;

    #[test]
    fn quad_area() {
        let mesh = quad("a", 0, 2.0);
        assert!((mesh.triangles_area() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn out_of_range_triangles_are_ignored() {
        let mut mesh = quad("a", 0, 1.0);
        mesh.indices.extend_from_slice(&[0, 1, 99]);
        assert_eq!(mesh.triangles().count(), 2);
        assert!((mesh.triangles_area() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn lod_screen_sizes_halve() {
        let mut scene = SceneModel {
            lods: vec![Lod::default(), Lod::default(), Lod::default()],
            ..Default::default()
        };
        scene.calculate_lod_screen_sizes();
        let sizes: Vec<f32> = scene.lods.iter().map(|l| l.screen_size).collect();
        assert_eq!(sizes, vec![1.0, 0.5, 0.25]);
        assert_eq!(scene.min_screen_size(), 0.25);
    }

    #[test]
    fn empty_scene_has_no_meshes() {
        assert!(SceneModel::default().has_no_meshes());
        let scene = SceneModel {
            lods: vec![Lod::default()],
            ..Default::default()
        };
        assert!(scene.has_no_meshes());
    }

    #[test]
    fn lod_bounds_merge_meshes() {
        let mut other = quad("b", 0, 1.0);
        for p in &mut other.positions {
            p[2] = -3.0;
        }
        let lod = Lod::new(vec![quad("a", 0, 2.0), other]);
        let bounds = lod.bounds();
        assert_eq!(bounds.min, [0.0, 0.0, -3.0]);
        assert_eq!(bounds.max, [2.0, 2.0, 0.0]);
    }
}
