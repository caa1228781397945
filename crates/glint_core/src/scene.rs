//! Scene description loading.
//!
//! Scenes are JSON files: image settings plus camera, lights, meshes,
//! objects, textures and materials tables. The serde structs below mirror
//! the file shape one-to-one; `Scene::load` validates them into the typed
//! model the renderer consumes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glint_math::{Mat4, UVec2, Vec3};
use serde::Deserialize;

use crate::camera::Camera;
use crate::error::{SceneError, SceneResult};
use crate::light::PointLight;
use crate::material::{Albedo, Material, MaterialKind};
use crate::mesh::Mesh;
use crate::texture::{Bitmap, Texture};

/// A renderable object: a mesh placed in the world.
///
/// `transform` is `None` for objects sitting at identity, which lets the
/// renderer skip the ray transform entirely.
#[derive(Clone, Debug)]
pub struct SceneObject {
    /// Index into [`Scene::meshes`].
    pub mesh: usize,
    pub transform: Option<Mat4>,
    pub material_index: usize,
}

/// A fully loaded and validated scene.
#[derive(Clone, Debug)]
pub struct Scene {
    pub resolution: UVec2,
    pub background: Vec3,
    pub camera: Camera,
    pub lights: Vec<PointLight>,
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Arc<Mesh>>,
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Load a scene from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path.parent())
    }

    /// Parse a scene from JSON text.
    ///
    /// `base_dir` anchors relative bitmap-texture paths; pass `None` when
    /// the scene references no files.
    pub fn from_json(text: &str, base_dir: Option<&Path>) -> SceneResult<Self> {
        let file: SceneFile = serde_json::from_str(text)?;
        build_scene(file, base_dir)
    }
}

// ---------------------------------------------------------------------------
// File-shape mirror
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SceneFile {
    settings: SettingsDesc,
    camera: CameraDesc,
    #[serde(default)]
    lights: Vec<LightDesc>,
    #[serde(default)]
    meshes: Vec<MeshDesc>,
    #[serde(default)]
    objects: Vec<ObjectDesc>,
    #[serde(default)]
    textures: Vec<TextureDesc>,
    #[serde(default)]
    materials: Vec<MaterialDesc>,
}

#[derive(Deserialize)]
struct SettingsDesc {
    image_settings: ImageSettingsDesc,
    background_color: Vec<f32>,
}

#[derive(Deserialize)]
struct ImageSettingsDesc {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct CameraDesc {
    /// 9 floats, the row-major 3x3 view basis.
    matrix: Vec<f32>,
    position: [f32; 3],
    /// Degrees.
    fov: Option<f32>,
    /// Row-major 4x4 pose per animation frame.
    #[serde(default)]
    animation: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct LightDesc {
    position: [f32; 3],
    intensity: f32,
    color: Option<[f32; 3]>,
}

#[derive(Deserialize)]
struct MeshDesc {
    vertices: Vec<f32>,
    triangles: Vec<i64>,
    uvs: Option<Vec<f32>>,
    material_index: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ObjectDesc {
    Reference {
        #[serde(rename = "ref")]
        mesh: usize,
        /// 16 floats, row-major.
        transform: Option<Vec<f32>>,
        material_index: Option<usize>,
    },
    Inline(MeshDesc),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TextureDesc {
    Albedo {
        name: String,
        albedo: [f32; 3],
    },
    Checker {
        name: String,
        #[serde(rename = "color_A")]
        color_a: [f32; 3],
        #[serde(rename = "color_B")]
        color_b: [f32; 3],
        square_size: f32,
    },
    Edges {
        name: String,
        edge_color: [f32; 3],
        inner_color: [f32; 3],
        edge_width: f32,
    },
    Bitmap {
        name: String,
        file_path: String,
    },
}

impl TextureDesc {
    fn name(&self) -> &str {
        match self {
            TextureDesc::Albedo { name, .. }
            | TextureDesc::Checker { name, .. }
            | TextureDesc::Edges { name, .. }
            | TextureDesc::Bitmap { name, .. } => name,
        }
    }
}

/// Diffuse albedo is either an inline colour or a texture name.
#[derive(Deserialize)]
#[serde(untagged)]
enum AlbedoDesc {
    Color([f32; 3]),
    Texture(String),
}

#[derive(Deserialize)]
struct MaterialDesc {
    #[serde(rename = "type")]
    kind: String,
    albedo: Option<AlbedoDesc>,
    ior: Option<f32>,
    // some scene files spell this "absorbtion"
    #[serde(alias = "absorbtion")]
    absorption: Option<[f32; 3]>,
    smooth_shading: Option<bool>,
    back_face_culling: Option<bool>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn build_scene(file: SceneFile, base_dir: Option<&Path>) -> SceneResult<Scene> {
    let resolution = UVec2::new(
        file.settings.image_settings.width,
        file.settings.image_settings.height,
    );
    if resolution.x == 0 || resolution.y == 0 {
        return Err(SceneError::config("image resolution must be positive"));
    }

    let background = match file.settings.background_color.as_slice() {
        [r, g, b] | [r, g, b, _] => Vec3::new(*r, *g, *b),
        other => {
            return Err(SceneError::config(format!(
                "background_color needs 3 or 4 components, got {}",
                other.len()
            )))
        }
    };

    let camera = build_camera(file.camera, resolution)?;
    let (textures, texture_names) = build_textures(file.textures, base_dir)?;
    let materials = build_materials(file.materials, &texture_names)?;

    let lights: Vec<_> = file
        .lights
        .into_iter()
        .map(|light| {
            let mut l = PointLight::new(Vec3::from(light.position), light.intensity);
            if let Some(color) = light.color {
                l = l.with_color(Vec3::from(color));
            }
            l
        })
        .collect();

    // Shared meshes first; objects may reference them or carry their own.
    let mut meshes = Vec::new();
    let mut mesh_default_materials = Vec::new();
    for desc in file.meshes {
        let (mesh, material) = build_mesh(desc)?;
        meshes.push(Arc::new(mesh));
        mesh_default_materials.push(material);
    }

    let mut objects = Vec::new();
    for desc in file.objects {
        match desc {
            ObjectDesc::Reference {
                mesh,
                transform,
                material_index,
            } => {
                if mesh >= meshes.len() {
                    return Err(SceneError::config(format!(
                        "object references mesh {} but only {} meshes exist",
                        mesh,
                        meshes.len()
                    )));
                }
                let transform = transform
                    .map(|t| parse_mat4(&t))
                    .transpose()?
                    // identity placements trace exactly like the bare mesh
                    .filter(|m| *m != Mat4::IDENTITY);
                objects.push(SceneObject {
                    mesh,
                    transform,
                    material_index: material_index.unwrap_or(mesh_default_materials[mesh]),
                });
            }
            ObjectDesc::Inline(desc) => {
                let (mesh, material) = build_mesh(desc)?;
                meshes.push(Arc::new(mesh));
                mesh_default_materials.push(material);
                objects.push(SceneObject {
                    mesh: meshes.len() - 1,
                    transform: None,
                    material_index: material,
                });
            }
        }
    }

    for object in &objects {
        if object.material_index >= materials.len() {
            return Err(SceneError::config(format!(
                "object material index {} out of range ({} materials)",
                object.material_index,
                materials.len()
            )));
        }
    }

    log::debug!(
        "scene loaded: {} objects, {} lights, {} materials, {} textures",
        objects.len(),
        lights.len(),
        materials.len(),
        textures.len()
    );

    Ok(Scene {
        resolution,
        background,
        camera,
        lights,
        textures,
        materials,
        meshes,
        objects,
    })
}

fn build_mesh(desc: MeshDesc) -> SceneResult<(Mesh, usize)> {
    let mesh = Mesh::from_arrays(&desc.vertices, &desc.triangles, desc.uvs.as_deref())?;
    Ok((mesh, desc.material_index.unwrap_or(0)))
}

fn build_camera(desc: CameraDesc, resolution: UVec2) -> SceneResult<Camera> {
    if desc.matrix.len() != 9 {
        return Err(SceneError::config(format!(
            "camera matrix needs 9 components, got {}",
            desc.matrix.len()
        )));
    }
    let m = &desc.matrix;
    let rows = [
        Vec3::new(m[0], m[1], m[2]),
        Vec3::new(m[3], m[4], m[5]),
        Vec3::new(m[6], m[7], m[8]),
    ];

    let fov_degrees = desc.fov.unwrap_or(90.0);
    if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
        return Err(SceneError::config(format!(
            "camera fov must be in (0, 180) degrees, got {fov_degrees}"
        )));
    }

    let mut camera = Camera::from_basis(
        rows,
        Vec3::from(desc.position),
        fov_degrees.to_radians(),
        resolution,
    );

    for (i, pose) in desc.animation.iter().enumerate() {
        let pose = parse_mat4(pose).map_err(|_| {
            SceneError::config(format!("animation frame {i} needs 16 components"))
        })?;
        camera.frames.push(pose);
    }

    Ok(camera)
}

/// 16 row-major floats into a matrix usable as `view * v`.
///
/// The file stores row-vector-convention matrices (translation in the last
/// row); reading the floats column-wise is exactly the transpose we need.
fn parse_mat4(values: &[f32]) -> SceneResult<Mat4> {
    let array: [f32; 16] = values.try_into().map_err(|_| {
        SceneError::config(format!(
            "transform needs 16 components, got {}",
            values.len()
        ))
    })?;
    Ok(Mat4::from_cols_array(&array))
}

fn build_textures(
    descs: Vec<TextureDesc>,
    base_dir: Option<&Path>,
) -> SceneResult<(Vec<Texture>, HashMap<String, usize>)> {
    let mut textures = Vec::with_capacity(descs.len());
    let mut names = HashMap::new();
    for desc in descs {
        names.insert(desc.name().to_string(), textures.len());
        let texture = match desc {
            TextureDesc::Albedo { albedo, .. } => Texture::Albedo(Vec3::from(albedo)),
            TextureDesc::Checker {
                color_a,
                color_b,
                square_size,
                ..
            } => Texture::Checker {
                color_a: Vec3::from(color_a),
                color_b: Vec3::from(color_b),
                square_size,
            },
            TextureDesc::Edges {
                edge_color,
                inner_color,
                edge_width,
                ..
            } => Texture::Edges {
                edge_color: Vec3::from(edge_color),
                inner_color: Vec3::from(inner_color),
                edge_width,
            },
            TextureDesc::Bitmap { ref file_path, .. } => {
                let mut path = Path::new(file_path).to_path_buf();
                if path.is_relative() {
                    if let Some(base) = base_dir {
                        path = base.join(path);
                    }
                }
                Texture::Bitmap(Bitmap::load(&path)?)
            }
        };
        textures.push(texture);
    }
    Ok((textures, names))
}

fn build_materials(
    descs: Vec<MaterialDesc>,
    texture_names: &HashMap<String, usize>,
) -> SceneResult<Vec<Material>> {
    if descs.is_empty() {
        log::warn!("no materials in scene file, using the default material");
        return Ok(vec![Material::default_diffuse()]);
    }

    let mut materials = Vec::with_capacity(descs.len());
    for desc in descs {
        let kind = match desc.kind.as_str() {
            "diffuse" => MaterialKind::Diffuse {
                albedo: resolve_albedo(desc.albedo, texture_names)?,
            },
            "reflective" => MaterialKind::Reflective {
                albedo: require_color(desc.albedo, "reflective")?,
            },
            "refractive" => MaterialKind::Refractive {
                ior: desc.ior.unwrap_or(1.5),
                absorption: desc.absorption.map(Vec3::from).unwrap_or(Vec3::ZERO),
            },
            "constant" => MaterialKind::Constant {
                albedo: require_color(desc.albedo, "constant")?,
            },
            other => {
                return Err(SceneError::config(format!(
                    "unknown material type: {other}"
                )))
            }
        };

        let mut material = Material::new(kind);
        if let Some(smooth) = desc.smooth_shading {
            material.smooth = smooth;
        }
        if let Some(culling) = desc.back_face_culling {
            material.double_sided = !culling;
        }
        materials.push(material);
    }
    Ok(materials)
}

fn resolve_albedo(
    desc: Option<AlbedoDesc>,
    texture_names: &HashMap<String, usize>,
) -> SceneResult<Albedo> {
    match desc {
        Some(AlbedoDesc::Color(color)) => Ok(Albedo::Color(Vec3::from(color))),
        Some(AlbedoDesc::Texture(name)) => texture_names
            .get(&name)
            .map(|&index| Albedo::Texture(index))
            .ok_or_else(|| SceneError::config(format!("unknown texture: {name}"))),
        None => Ok(Albedo::Color(Vec3::ONE)),
    }
}

fn require_color(desc: Option<AlbedoDesc>, kind: &str) -> SceneResult<Vec3> {
    match desc {
        Some(AlbedoDesc::Color(color)) => Ok(Vec3::from(color)),
        Some(AlbedoDesc::Texture(_)) => Err(SceneError::config(format!(
            "{kind} material albedo must be a colour"
        ))),
        None => Err(SceneError::config(format!(
            "{kind} material is missing its albedo"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "settings": {
            "image_settings": { "width": 4, "height": 4 },
            "background_color": [0.2, 0.3, 0.4]
        },
        "camera": {
            "matrix": [1, 0, 0, 0, 1, 0, 0, 0, 1],
            "position": [0, 0, 0]
        }
    }"#;

    #[test]
    fn test_minimal_scene() {
        let scene = Scene::from_json(MINIMAL, None).unwrap();

        assert_eq!(scene.resolution, UVec2::new(4, 4));
        assert_eq!(scene.background, Vec3::new(0.2, 0.3, 0.4));
        assert!(scene.objects.is_empty());
        // A default material is always present
        assert_eq!(scene.materials.len(), 1);
    }

    #[test]
    fn test_inline_and_referenced_objects() {
        let json = r#"{
            "settings": {
                "image_settings": { "width": 8, "height": 8 },
                "background_color": [0, 0, 0]
            },
            "camera": {
                "matrix": [1, 0, 0, 0, 1, 0, 0, 0, 1],
                "position": [0, 0, 0],
                "fov": 60
            },
            "lights": [
                { "position": [0, 5, 0], "intensity": 30 }
            ],
            "meshes": [
                {
                    "vertices": [-1, -1, -5, 1, -1, -5, 0, 1, -5],
                    "triangles": [0, 1, 2],
                    "material_index": 1
                }
            ],
            "objects": [
                { "ref": 0 },
                {
                    "ref": 0,
                    "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 3,0,0,1],
                    "material_index": 0
                },
                {
                    "vertices": [0, 0, -3, 1, 0, -3, 0, 1, -3],
                    "triangles": [0, 1, 2]
                }
            ],
            "materials": [
                { "type": "diffuse", "albedo": [1, 1, 1] },
                { "type": "reflective", "albedo": [0.9, 0.9, 0.9] }
            ]
        }"#;

        let scene = Scene::from_json(json, None).unwrap();

        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.lights.len(), 1);

        // Plain reference inherits the mesh's material
        assert_eq!(scene.objects[0].material_index, 1);
        assert!(scene.objects[0].transform.is_none());

        // Reference with overrides
        assert_eq!(scene.objects[1].material_index, 0);
        let transform = scene.objects[1].transform.unwrap();
        let moved = transform.transform_point3(Vec3::ZERO);
        assert_eq!(moved, Vec3::new(3.0, 0.0, 0.0));

        // Inline object got its own mesh entry
        assert_eq!(scene.objects[2].mesh, 1);
    }

    #[test]
    fn test_material_and_texture_tables() {
        let json = r#"{
            "settings": {
                "image_settings": { "width": 2, "height": 2 },
                "background_color": [0, 0, 0, 1]
            },
            "camera": { "matrix": [1,0,0,0,1,0,0,0,1], "position": [0,0,0] },
            "textures": [
                { "name": "white", "type": "albedo", "albedo": [1, 1, 1] },
                {
                    "name": "board", "type": "checker",
                    "color_A": [0, 0, 0], "color_B": [1, 1, 1], "square_size": 0.5
                }
            ],
            "materials": [
                { "type": "diffuse", "albedo": "board", "smooth_shading": true },
                { "type": "refractive", "ior": 1.5, "absorption": [0.1, 0.2, 0.3] },
                { "type": "constant", "albedo": [1, 0, 0] }
            ]
        }"#;

        let scene = Scene::from_json(json, None).unwrap();

        assert_eq!(scene.textures.len(), 2);
        assert!(matches!(
            scene.materials[0].kind,
            MaterialKind::Diffuse {
                albedo: Albedo::Texture(1)
            }
        ));
        assert!(scene.materials[0].smooth);
        assert!(matches!(
            scene.materials[1].kind,
            MaterialKind::Refractive { ior, .. } if (ior - 1.5).abs() < 1e-6
        ));
    }

    #[test]
    fn test_unknown_material_type_rejected() {
        let bad = r#"{
            "settings": {
                "image_settings": { "width": 2, "height": 2 },
                "background_color": [0, 0, 0]
            },
            "camera": { "matrix": [1,0,0,0,1,0,0,0,1], "position": [0,0,0] },
            "materials": [ { "type": "velvet" } ]
        }"#;
        assert!(matches!(
            Scene::from_json(bad, None),
            Err(SceneError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_texture_name_rejected() {
        let bad = r#"{
            "settings": {
                "image_settings": { "width": 2, "height": 2 },
                "background_color": [0, 0, 0]
            },
            "camera": { "matrix": [1,0,0,0,1,0,0,0,1], "position": [0,0,0] },
            "materials": [ { "type": "diffuse", "albedo": "missing" } ]
        }"#;
        assert!(matches!(
            Scene::from_json(bad, None),
            Err(SceneError::Config(_))
        ));
    }

    #[test]
    fn test_bad_mesh_reference_rejected() {
        let bad = r#"{
            "settings": {
                "image_settings": { "width": 2, "height": 2 },
                "background_color": [0, 0, 0]
            },
            "camera": { "matrix": [1,0,0,0,1,0,0,0,1], "position": [0,0,0] },
            "objects": [ { "ref": 3 } ]
        }"#;
        assert!(matches!(
            Scene::from_json(bad, None),
            Err(SceneError::Config(_))
        ));
    }

    #[test]
    fn test_not_json_is_a_parse_error() {
        assert!(matches!(
            Scene::from_json("not json at all", None),
            Err(SceneError::Json(_))
        ));
    }
}
