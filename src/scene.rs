//! Scene documents: JSON with `Materials`, `Camera` and `Objects` sections,
//! converted into the immutable buffers the renderer reads.

use crate::affine::Affine;
use crate::aliases::Vec3;
use crate::camera::Camera;
use crate::config::{RenderSettings, MAX_TRACE_DEPTH};
use crate::error::{Error, Result};
use crate::geometry::mesh::{MeshBuffers, MeshRange, Triangle, Vertex};
use crate::geometry::{Geometry, Shape};
use crate::material::{Material, MaterialId};
use crate::obj_file::ObjFile;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "TYPE")]
enum MaterialDesc {
    Emitting {
        #[serde(rename = "RGB")]
        rgb: [f32; 3],
        #[serde(rename = "EMITTANCE")]
        emittance: f32,
    },
    Diffuse {
        #[serde(rename = "RGB")]
        rgb: [f32; 3],
    },
    Specular {
        #[serde(rename = "RGB")]
        rgb: [f32; 3],
        #[serde(rename = "ROUGHNESS")]
        roughness: Option<f32>,
    },
    Transmitting {
        #[serde(rename = "RGB")]
        rgb: [f32; 3],
        #[serde(rename = "ROUGHNESS")]
        roughness: Option<f32>,
        #[serde(rename = "TRANSMITTANCE")]
        transmittance: f32,
        #[serde(rename = "IOR")]
        ior: f32,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct CameraDesc {
    res: [usize; 2],
    fovy: f32,
    iterations: u32,
    depth: u32,
    file: String,
    eye: [f32; 3],
    lookat: [f32; 3],
    up: [f32; 3],
    aperture: Option<f32>,
    focaldist: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ShapeType {
    Cube,
    Sphere,
    Mesh,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct ObjectDesc {
    #[serde(rename = "TYPE")]
    shape: ShapeType,
    material: String,
    trans: Option<[f32; 3]>,
    rotat: Option<[f32; 3]>,
    scale: Option<[f32; 3]>,
    /// OBJ file of a mesh, relative to the scene file.
    file: Option<String>,
    vertices: Option<Vec<[f32; 3]>>,
    /// Polygons as 0-based indices into `vertices`.
    faces: Option<Vec<Vec<u32>>>,
}

/// Raw scene document.
#[derive(Debug, Deserialize)]
pub struct SceneDesc {
    #[serde(rename = "Materials")]
    materials: BTreeMap<String, MaterialDesc>,
    #[serde(rename = "Camera")]
    camera: CameraDesc,
    #[serde(rename = "Objects")]
    objects: Vec<ObjectDesc>,
}

/// Everything the renderer reads; immutable once built.
#[derive(Clone, Debug)]
pub struct Scene {
    pub camera: Camera,
    pub materials: Vec<Material>,
    pub geometries: Vec<Geometry>,
    pub meshes: MeshBuffers,
    /// Iteration count and trace depth from the camera section; the other
    /// fields take their defaults.
    pub settings: RenderSettings,
    /// Final image path, as named by the camera section.
    pub output: PathBuf,
}

fn clamp_rgb(name: &str, rgb: [f32; 3]) -> Vec3 {
    let v = Vec3::from(rgb);
    let clamped = v.map(|c| c.max(0.0).min(1.0));
    if clamped != v {
        warn!(material = name, "RGB {:?} outside [0, 1], clamped", rgb);
    }
    clamped
}

fn check_unit_interval(material: &str, field: &str, value: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidMaterial {
            material: material.to_string(),
            reason: format!("{} must lie in [0, 1], got {}", field, value),
        })
    }
}

impl MaterialDesc {
    fn build(&self, name: &str) -> Result<Material> {
        let material = match *self {
            MaterialDesc::Emitting { rgb, emittance } => {
                if !(emittance >= 0.0 && emittance.is_finite()) {
                    return Err(Error::InvalidMaterial {
                        material: name.to_string(),
                        reason: format!("EMITTANCE must be finite and non-negative, got {}", emittance),
                    });
                }
                Material::Emitting {
                    color: clamp_rgb(name, rgb),
                    emittance,
                }
            }
            MaterialDesc::Diffuse { rgb } => Material::Diffuse {
                color: clamp_rgb(name, rgb),
            },
            MaterialDesc::Specular { rgb, roughness } => Material::Specular {
                color: clamp_rgb(name, rgb),
                roughness: check_unit_interval(name, "ROUGHNESS", roughness.unwrap_or(0.0))?,
            },
            MaterialDesc::Transmitting {
                rgb,
                roughness,
                transmittance,
                ior,
            } => {
                if !(ior > 0.0 && ior.is_finite()) {
                    return Err(Error::InvalidMaterial {
                        material: name.to_string(),
                        reason: format!("IOR must be positive, got {}", ior),
                    });
                }
                Material::Transmitting {
                    color: clamp_rgb(name, rgb),
                    roughness: check_unit_interval(name, "ROUGHNESS", roughness.unwrap_or(0.0))?,
                    transmittance: check_unit_interval(name, "TRANSMITTANCE", transmittance)?,
                    ior,
                }
            }
        };
        Ok(material)
    }
}

impl CameraDesc {
    fn build(&self) -> Result<Camera> {
        let [width, height] = self.res;
        if width == 0 || height == 0 {
            return Err(Error::InvalidCamera(format!(
                "resolution {}x{} has no pixels",
                width, height
            )));
        }
        if !(self.fovy > 0.0 && self.fovy < 180.0) {
            return Err(Error::InvalidCamera(format!(
                "FOVY must lie in (0, 180), got {}",
                self.fovy
            )));
        }
        if self.iterations == 0 {
            return Err(Error::InvalidCamera("ITERATIONS must be positive".to_string()));
        }
        if self.depth == 0 || self.depth > MAX_TRACE_DEPTH {
            return Err(Error::InvalidCamera(format!(
                "DEPTH must lie in 1..={}, got {}",
                MAX_TRACE_DEPTH, self.depth
            )));
        }
        let eye = Vec3::from(self.eye);
        let look_at = Vec3::from(self.lookat);
        let up = Vec3::from(self.up);
        let view = look_at - eye;
        if view.norm() < 1e-6 {
            return Err(Error::InvalidCamera("EYE and LOOKAT coincide".to_string()));
        }
        if view.normalize().cross(&up).norm() < 1e-6 {
            return Err(Error::InvalidCamera(
                "UP is parallel to the viewing direction".to_string(),
            ));
        }
        let aperture = self.aperture.unwrap_or(0.0);
        if !(aperture >= 0.0) {
            return Err(Error::InvalidCamera(format!(
                "APERTURE must be non-negative, got {}",
                aperture
            )));
        }
        let focus_dist = self.focaldist.unwrap_or_else(|| view.norm());
        if !(focus_dist > 0.0) {
            return Err(Error::InvalidCamera(format!(
                "FOCALDIST must be positive, got {}",
                focus_dist
            )));
        }
        Ok(Camera::new(
            width, height, &eye, &look_at, &up, self.fovy, aperture, focus_dist,
        ))
    }
}

fn inline_mesh(
    object: usize,
    vertices: &[[f32; 3]],
    faces: &[Vec<u32>],
) -> Result<(Vec<Vertex>, Vec<Triangle>)> {
    let mut triangles = Vec::new();
    for (face_idx, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(Error::InvalidObject {
                object,
                reason: format!("face {} has fewer than three vertices", face_idx),
            });
        }
        if let Some(bad) = face.iter().find(|i| **i as usize >= vertices.len()) {
            return Err(Error::InvalidObject {
                object,
                reason: format!(
                    "face {} references vertex {} but only {} exist",
                    face_idx,
                    bad,
                    vertices.len()
                ),
            });
        }
        for pair in face[1..].windows(2) {
            triangles.push(Triangle([face[0], pair[0], pair[1]]));
        }
    }
    let vertices = vertices
        .iter()
        .map(|p| Vertex {
            position: Vec3::from(*p),
            normal: Vec3::zeros(),
        })
        .collect();
    Ok((vertices, triangles))
}

impl ObjectDesc {
    fn transform(&self, object: usize) -> Result<Affine> {
        let trans = Vec3::from(self.trans.unwrap_or([0.0; 3]));
        let rotat = Vec3::from(self.rotat.unwrap_or([0.0; 3]));
        let scale = Vec3::from(self.scale.unwrap_or([1.0; 3]));
        Affine::from_trs(&trans, &rotat, &scale).ok_or_else(|| Error::InvalidObject {
            object,
            reason: format!("SCALE {:?} makes the transform singular", scale.as_slice()),
        })
    }
    /// Loads the object-space mesh from `FILE` or the inline arrays.
    /// Returns vertices, triangles and whether vertex normals were given.
    fn mesh_data(&self, object: usize, base_dir: &Path) -> Result<(Vec<Vertex>, Vec<Triangle>, bool)> {
        match (&self.file, &self.vertices, &self.faces) {
            (Some(file), None, None) => {
                let path = base_dir.join(file);
                let obj = ObjFile::from_file(&path).map_err(|source| Error::Mesh {
                    path: path.clone(),
                    source,
                })?;
                debug!(path = %path.display(), faces = obj.face_count(), "loaded OBJ");
                let (vertices, triangles) = obj.to_triangles();
                Ok((vertices, triangles, obj.has_normals()))
            }
            (None, Some(vertices), Some(faces)) => {
                let (vertices, triangles) = inline_mesh(object, vertices, faces)?;
                Ok((vertices, triangles, false))
            }
            _ => Err(Error::InvalidObject {
                object,
                reason: "a mesh needs either FILE or both VERTICES and FACES".to_string(),
            }),
        }
    }
}

impl Scene {
    pub fn from_file(path: &Path) -> Result<Scene> {
        let text = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&text, base_dir)
    }
    /// * `base_dir` - directory that relative mesh file names resolve against
    pub fn from_json_str(text: &str, base_dir: &Path) -> Result<Scene> {
        let desc: SceneDesc = serde_json::from_str(text)?;
        Self::from_desc(&desc, base_dir)
    }
    pub fn from_desc(desc: &SceneDesc, base_dir: &Path) -> Result<Scene> {
        let mut materials = Vec::with_capacity(desc.materials.len());
        let mut material_ids = HashMap::<&str, MaterialId>::new();
        for (name, mat) in &desc.materials {
            material_ids.insert(name.as_str(), materials.len());
            materials.push(mat.build(name)?);
        }
        if !materials
            .iter()
            .any(|m| matches!(m, Material::Emitting { emittance, .. } if *emittance > 0.0))
        {
            warn!("scene has no emitting material, the image will be black");
        }

        let camera = desc.camera.build()?;

        let mut geometries = Vec::with_capacity(desc.objects.len());
        let mut meshes = MeshBuffers::default();
        for (idx, obj) in desc.objects.iter().enumerate() {
            let material_id =
                *material_ids
                    .get(obj.material.as_str())
                    .ok_or_else(|| Error::UnknownMaterial {
                        object: idx,
                        name: obj.material.clone(),
                    })?;
            let transform = obj.transform(idx)?;
            let shape = match obj.shape {
                ShapeType::Cube => Shape::Cube,
                ShapeType::Sphere => Shape::Sphere,
                ShapeType::Mesh => {
                    let (mut vertices, mut triangles, smooth) = obj.mesh_data(idx, base_dir)?;
                    if triangles.is_empty() {
                        return Err(Error::InvalidObject {
                            object: idx,
                            reason: "mesh has no faces".to_string(),
                        });
                    }
                    for v in &mut vertices {
                        v.position = transform.act_point(&v.position);
                        if v.normal != Vec3::zeros() {
                            v.normal = transform.act_normal(&v.normal).normalize();
                        }
                    }
                    // a mirroring transform flips the winding; restore counter-clockwise
                    if transform.determinant() < 0.0 {
                        for tri in &mut triangles {
                            tri.0.swap(1, 2);
                        }
                    }
                    let (range, bounds) = meshes.append(&vertices, &triangles);
                    Shape::Mesh(MeshRange {
                        triangles: range,
                        bounds,
                        smooth,
                        cullable: !materials[material_id].is_transmissive(),
                    })
                }
            };
            geometries.push(Geometry::new(shape, material_id, transform));
        }
        info!(
            width = camera.width(),
            height = camera.height(),
            materials = materials.len(),
            objects = geometries.len(),
            triangles = meshes.triangles.len(),
            "scene loaded"
        );

        let mut output = PathBuf::from(&desc.camera.file);
        if output.extension().map_or(true, |ext| ext != "png") {
            output.set_extension(match output.extension() {
                Some(ext) => format!("{}.png", ext.to_string_lossy()),
                None => "png".to_string(),
            });
        }

        Ok(Scene {
            settings: RenderSettings::new(desc.camera.iterations, desc.camera.depth),
            camera,
            materials,
            geometries,
            meshes,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::Ray;
    use std::io::Write;

    fn document(materials: &str, objects: &str) -> String {
        format!(
            r#"{{
                "Materials": {{ {} }},
                "Camera": {{
                    "RES": [4, 3], "FOVY": 45.0, "ITERATIONS": 2, "DEPTH": 3,
                    "FILE": "out", "EYE": [0, 0, 10], "LOOKAT": [0, 0, 0], "UP": [0, 1, 0]
                }},
                "Objects": [ {} ]
            }}"#,
            materials, objects
        )
    }

    const LIGHT: &str = r#""light": {"TYPE": "Emitting", "RGB": [1, 1, 1], "EMITTANCE": 5}"#;

    fn load(materials: &str, objects: &str) -> Result<Scene> {
        Scene::from_json_str(&document(materials, objects), Path::new("."))
    }

    #[test]
    fn loads_materials_camera_and_objects() {
        let scene = load(
            &format!(
                r#"{}, "glass": {{"TYPE": "Transmitting", "RGB": [1, 1, 1], "TRANSMITTANCE": 1, "IOR": 1.5}}"#,
                LIGHT
            ),
            r#"{"TYPE": "sphere", "MATERIAL": "glass", "TRANS": [0, 0, -1], "ROTAT": [0, 0, 0], "SCALE": [2, 2, 2]},
               {"TYPE": "cube", "MATERIAL": "light"}"#,
        )
        .unwrap();
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(scene.geometries.len(), 2);
        assert_eq!(scene.camera.pixel_count(), 12);
        assert_eq!(scene.settings.iterations, 2);
        assert_eq!(scene.settings.max_depth, 3);
        assert_eq!(scene.output, PathBuf::from("out.png"));
        let glass = scene.geometries[0].material_id;
        assert!(scene.materials[glass].is_transmissive());
    }

    #[test]
    fn unknown_material_is_rejected() {
        let err = load(LIGHT, r#"{"TYPE": "cube", "MATERIAL": "chrome"}"#).unwrap_err();
        assert!(matches!(err, Error::UnknownMaterial { object: 0, ref name } if name == "chrome"));
    }

    #[test]
    fn missing_type_specific_field_is_rejected() {
        let err = load(
            r#""glass": {"TYPE": "Transmitting", "RGB": [1, 1, 1], "TRANSMITTANCE": 1}"#,
            "",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        let err = load(r#""x": {"TYPE": "Velvet", "RGB": [1, 1, 1]}"#, "").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn out_of_range_color_is_clamped() {
        let scene = load(r#""red": {"TYPE": "Diffuse", "RGB": [1.5, -0.5, 0.5]}"#, "").unwrap();
        assert_eq!(scene.materials[0].color(), Vec3::new(1.0, 0.0, 0.5));
    }

    #[test]
    fn singular_scale_is_rejected() {
        let err = load(
            LIGHT,
            r#"{"TYPE": "cube", "MATERIAL": "light", "SCALE": [1, 0, 1]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidObject { object: 0, .. }));
    }

    #[test]
    fn out_of_range_depth_is_rejected() {
        let text = document(LIGHT, "").replace(r#""DEPTH": 3"#, r#""DEPTH": 0"#);
        let err = Scene::from_json_str(&text, Path::new(".")).unwrap_err();
        assert!(matches!(err, Error::InvalidCamera(_)));
        let text = document(LIGHT, "").replace(r#""DEPTH": 3"#, r#""DEPTH": 4294967295"#);
        let err = Scene::from_json_str(&text, Path::new(".")).unwrap_err();
        assert!(matches!(err, Error::InvalidCamera(_)));
    }

    #[test]
    fn inline_mesh_is_moved_to_world_space() {
        let scene = load(
            LIGHT,
            r#"{"TYPE": "mesh", "MATERIAL": "light", "TRANS": [0, 0, -5],
                "VERTICES": [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]],
                "FACES": [[0, 1, 2, 3]]}"#,
        )
        .unwrap();
        assert_eq!(scene.meshes.triangles.len(), 2);
        assert_eq!(scene.meshes.vertices[2].position, Vec3::new(1.0, 1.0, -5.0));
        let err = load(
            LIGHT,
            r#"{"TYPE": "mesh", "MATERIAL": "light",
                "VERTICES": [[0, 0, 0], [1, 0, 0], [1, 1, 0]], "FACES": [[0, 1, 3]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidObject { object: 0, .. }));
    }

    #[test]
    fn mirrored_mesh_keeps_outward_facing_triangles() {
        // closed unit cube, counter-clockwise from outside
        let cube = r#""VERTICES": [[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5],
                                   [-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]],
                       "FACES": [[0, 3, 2, 1], [4, 5, 6, 7], [0, 1, 5, 4], [3, 7, 6, 2], [0, 4, 7, 3], [1, 2, 6, 5]]"#;
        let ray = Ray::new(&Vec3::new(0.1, 0.2, 8.0), &Vec3::new(0.0, 0.0, -1.0));
        for scale in &["[2, 2, 2]", "[-2, 2, 2]", "[-2, -2, -2]"] {
            let scene = load(
                LIGHT,
                &format!(r#"{{"TYPE": "mesh", "MATERIAL": "light", "SCALE": {}, {}}}"#, scale, cube),
            )
            .unwrap();
            for &cull in &[false, true] {
                let hit = scene.geometries[0].hit(&ray, &scene.meshes, cull).unwrap();
                assert!((hit.t - 7.0).abs() < 1e-4, "scale {} cull {}: t = {}", scale, cull, hit.t);
                assert!(hit.outside, "scale {} cull {}", scale, cull);
                assert!((hit.normal - Vec3::new(0.0, 0.0, 1.0)).norm() < 1e-4);
            }
        }
    }

    #[test]
    fn obj_file_resolves_against_the_scene_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut obj = std::fs::File::create(dir.path().join("tri.obj")).unwrap();
        writeln!(obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1").unwrap();
        let scene_path = dir.path().join("scene.json");
        std::fs::write(
            &scene_path,
            document(LIGHT, r#"{"TYPE": "mesh", "MATERIAL": "light", "FILE": "tri.obj"}"#),
        )
        .unwrap();
        let scene = Scene::from_file(&scene_path).unwrap();
        match &scene.geometries[0].shape {
            Shape::Mesh(range) => {
                assert!(range.smooth);
                assert_eq!(range.triangles, 0..1);
            }
            other => panic!("unexpected shape {:?}", other),
        }

        std::fs::write(
            &scene_path,
            document(LIGHT, r#"{"TYPE": "mesh", "MATERIAL": "light", "FILE": "missing.obj"}"#),
        )
        .unwrap();
        assert!(matches!(Scene::from_file(&scene_path), Err(Error::Mesh { .. })));
    }
}
