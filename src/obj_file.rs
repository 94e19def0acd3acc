//! Wavefront OBJ subset: positions, normals, texture coordinates and
//! polygonal faces. Groups, objects, smoothing groups and materials are
//! accepted and ignored.

use crate::aliases::Vec3;
use crate::geometry::mesh::{Triangle, Vertex};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: index {index} is out of range")]
    IndexOutOfRange { line: usize, index: i64 },

    #[error("the file contains no faces")]
    Empty,
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjVertex {
    vertex: usize,
    normal: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct ObjFace(Vec<ObjVertex>);

#[derive(Debug, Default)]
pub struct ObjFile {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coord_count: usize,
    faces: Vec<ObjFace>,
}

impl ObjFile {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        Self::from_buf_reader(BufReader::new(File::open(path)?))
    }
    pub fn from_buf_reader(reader: impl BufRead) -> Result<Self, Error> {
        let mut obj_file = ObjFile::default();
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let columns: Vec<&str> = line.split_whitespace().collect();
            match columns[0] {
                "v" => obj_file
                    .positions
                    .push(Self::parse_vec3_columns(&columns, line_no)?),
                "vn" => obj_file
                    .normals
                    .push(Self::parse_vec3_columns(&columns, line_no)?),
                "vt" => {
                    if columns.len() < 3 {
                        return Err(parse_error(line_no, "texture coordinate needs two values"));
                    }
                    obj_file.tex_coord_count += 1;
                }
                "f" => {
                    let face = obj_file.parse_face_columns(&columns, line_no)?;
                    obj_file.faces.push(face);
                }
                "g" | "o" | "s" | "usemtl" | "mtllib" => {}
                other => {
                    return Err(parse_error(
                        line_no,
                        format!("unsupported statement '{}'", other),
                    ))
                }
            }
        }
        if obj_file.faces.is_empty() {
            return Err(Error::Empty);
        }
        Ok(obj_file)
    }
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
    pub fn has_normals(&self) -> bool {
        self.faces
            .iter()
            .all(|face| face.0.iter().all(|v| v.normal.is_some()))
    }
    fn parse_vec3_columns(columns: &[&str], line_no: usize) -> Result<Vec3, Error> {
        if columns.len() < 4 {
            return Err(parse_error(line_no, "expected three coordinates"));
        }
        let mut parsed = [0.0f32; 3];
        for (dst, col) in parsed.iter_mut().zip(&columns[1..4]) {
            *dst = f32::from_str(col)
                .map_err(|e| parse_error(line_no, format!("'{}': {}", col, e)))?;
        }
        Ok(Vec3::new(parsed[0], parsed[1], parsed[2]))
    }
    fn parse_face_columns(&self, columns: &[&str], line_no: usize) -> Result<ObjFace, Error> {
        if columns.len() < 4 {
            return Err(parse_error(line_no, "a face needs at least three vertices"));
        }
        let mut face = ObjFace(Vec::with_capacity(columns.len() - 1));
        for col in &columns[1..] {
            face.0.push(self.parse_vertex_column(col, line_no)?);
        }
        Ok(face)
    }
    // `v`, `v/vt`, `v//vn` or `v/vt/vn`; indices are 1-based and negative
    // indices count back from the latest element.
    fn parse_vertex_column(&self, column: &str, line_no: usize) -> Result<ObjVertex, Error> {
        let indices: Vec<&str> = column.split('/').collect();
        if indices.is_empty() || indices.len() > 3 {
            return Err(parse_error(
                line_no,
                format!("invalid vertex definition '{}'", column),
            ));
        }
        let vertex = resolve_index(indices[0], self.positions.len(), line_no)?;
        if indices.len() >= 2 && !indices[1].is_empty() {
            resolve_index(indices[1], self.tex_coord_count, line_no)?;
        }
        let normal = match indices.get(2) {
            Some(s) if !s.is_empty() => Some(resolve_index(s, self.normals.len(), line_no)?),
            _ => None,
        };
        Ok(ObjVertex { vertex, normal })
    }
    /// Fan-triangulates every face. Corners sharing the same position and
    /// normal indices share one output vertex. Normals are zero unless every
    /// face carries them.
    pub fn to_triangles(&self) -> (Vec<Vertex>, Vec<Triangle>) {
        let with_normals = self.has_normals();
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut lookup = HashMap::<ObjVertex, u32>::new();
        let mut triangles = Vec::new();
        for face in &self.faces {
            let mut corner = |v: &ObjVertex| -> u32 {
                *lookup.entry(*v).or_insert_with(|| {
                    let normal = match v.normal {
                        Some(n) if with_normals => self.normals[n],
                        _ => Vec3::zeros(),
                    };
                    vertices.push(Vertex {
                        position: self.positions[v.vertex],
                        normal,
                    });
                    (vertices.len() - 1) as u32
                })
            };
            let first = corner(&face.0[0]);
            for pair in face.0[1..].windows(2) {
                let b = corner(&pair[0]);
                let c = corner(&pair[1]);
                triangles.push(Triangle([first, b, c]));
            }
        }
        (vertices, triangles)
    }
}

fn resolve_index(s: &str, count: usize, line_no: usize) -> Result<usize, Error> {
    let index = i64::from_str(s).map_err(|e| parse_error(line_no, format!("'{}': {}", s, e)))?;
    let resolved = if index > 0 {
        index - 1
    } else {
        count as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(Error::IndexOutOfRange {
            line: line_no,
            index,
        });
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ObjFile, Error> {
        ObjFile::from_buf_reader(text.as_bytes())
    }

    #[test]
    fn quad_is_fanned_into_two_triangles() {
        let obj = parse(
            "# unit quad\n\
             o quad\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             usemtl white\n\
             f 1 2 3 4\n",
        )
        .unwrap();
        let (vertices, triangles) = obj.to_triangles();
        assert_eq!(vertices.len(), 4);
        assert_eq!(triangles, vec![Triangle([0, 1, 2]), Triangle([0, 2, 3])]);
        assert!(vertices.iter().all(|v| v.normal == Vec3::zeros()));
    }

    #[test]
    fn negative_indices_and_normals() {
        let obj = parse(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvt 0 0\n\
             f -3/1/1 -2/-1/-1 -1//1\n",
        )
        .unwrap();
        assert!(obj.has_normals());
        let (vertices, triangles) = obj.to_triangles();
        assert_eq!(triangles.len(), 1);
        assert_eq!(vertices[1].position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(vertices[2].normal, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn errors_report_the_line() {
        match parse("v 0 0 0\nv 1 0 zero\n") {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
        match parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n") {
            Err(Error::IndexOutOfRange { line, index }) => {
                assert_eq!((line, index), (4, 4));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse("v 0 0 0\n"), Err(Error::Empty)));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2\n"),
            Err(Error::Parse { line: 4, .. })
        ));
    }
}
