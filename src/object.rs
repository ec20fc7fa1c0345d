use std::io;
use std::str::FromStr;

use quick_from::QuickFrom;

use glam::{
    Vec3,
};

#[derive(Debug, QuickFrom)]
pub enum Error {
    ObjFormat(usize),

    #[quick_from]
    Io(io::Error),
}

#[derive(Clone, Copy)]
pub struct LoadedObj {
    pub(crate) vao : glow::NativeVertexArray,
    pub(crate) count : usize,
    pub(crate) index_vbo : glow::NativeBuffer,
    pub(crate) vertex_vbo : glow::NativeBuffer,
    pub(crate) normal_vbo : glow::NativeBuffer,
}

pub struct Obj {
    pub indices : Vec<u32>,
    pub vertices : Vec<Vec3>,
    pub normals : Vec<Vec3>,
}

/// Per-vertex normals averaged over every face the vertex belongs to.
/// Faces are counter-clockwise triangles.
fn average_normals(vertices : &[Vec3], indices : &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let a = vertices[tri[0] as usize];
        let b = vertices[tri[1] as usize];
        let c = vertices[tri[2] as usize];

        let face = (b - a).cross(c - a);

        for idx in tri {
            normals[*idx as usize] += face;
        }
    }

    for n in normals.iter_mut() {
        *n = n.normalize_or_zero();
    }

    normals
}

impl Obj {
    pub fn plane() -> Self {

        use glam::{
            Vec3,
            const_vec3,
        };

        const VERTICES : [Vec3;4] = [
            // Front face
            const_vec3!([ -0.5, -0.5, 0.0 ]),
            const_vec3!([ -0.5,  0.5, 0.0 ]),
            const_vec3!([  0.5,  0.5, 0.0 ]),
            const_vec3!([  0.5, -0.5, 0.0 ]),
        ];

        const NORMALS : [Vec3;4] = [
            // Front face
            const_vec3!([ 0.0, 0.0, 1.0 ]),
            const_vec3!([ 0.0, 0.0, 1.0 ]),
            const_vec3!([ 0.0, 0.0, 1.0 ]),
            const_vec3!([ 0.0, 0.0, 1.0 ]),
        ];

        const INDICES : [u32;6] = [
            0, 1, 2, 0, 2, 3, // Front face
        ];

        Obj{
            indices : INDICES.to_vec(),
            vertices : VERTICES.to_vec(),
            normals : NORMALS.to_vec(),
        }
    }

    pub fn cube() -> Self {

        use glam::{
            Vec3,
            const_vec3,
        };

        const VERTICES : [Vec3;24] = [
            // Front face
            const_vec3!([ -0.5, -0.5, 0.5 ]),
            const_vec3!([ -0.5, 0.5, 0.5 ]),
            const_vec3!([ 0.5, 0.5, 0.5 ]),
            const_vec3!([ 0.5, -0.5, 0.5 ]),

            // Back face
            const_vec3!([ -0.5, -0.5, -0.5 ]),
            const_vec3!([ -0.5, 0.5, -0.5 ]),
            const_vec3!([ 0.5, 0.5, -0.5 ]),
            const_vec3!([ 0.5, -0.5, -0.5 ]),

            // Left face
            const_vec3!([ -0.5, -0.5, 0.5 ]),
            const_vec3!([ -0.5, 0.5, 0.5 ]),
            const_vec3!([ -0.5, 0.5, -0.5 ]),
            const_vec3!([ -0.5, -0.5, -0.5 ]),

            // Right face
            const_vec3!([ 0.5, -0.5, 0.5 ]),
            const_vec3!([ 0.5, 0.5, 0.5 ]),
            const_vec3!([ 0.5, 0.5, -0.5 ]),
            const_vec3!([ 0.5, -0.5, -0.5 ]),

            // Top face
            const_vec3!([ 0.5, 0.5, 0.5 ]),
            const_vec3!([ -0.5, 0.5, 0.5 ]),
            const_vec3!([ -0.5, 0.5, -0.5 ]),
            const_vec3!([ 0.5, 0.5, -0.5 ]),

            // Bottom face
            const_vec3!([ 0.5, -0.5, 0.5 ]),
            const_vec3!([ -0.5, -0.5, 0.5 ]),
            const_vec3!([ -0.5, -0.5, -0.5 ]),
            const_vec3!([ 0.5, -0.5, -0.5 ])
        ];

        const NORMALS : [Vec3;24] = [
            // Front face
            const_vec3!([0.0, 0.0, 1.0]),
            const_vec3!([0.0, 0.0, 1.0]),
            const_vec3!([ 0.0, 0.0, 1.0 ]),
            const_vec3!([ 0.0, 0.0, 1.0 ]),
            // Back face
            const_vec3!([ 0.0, 0.0, -1.0 ]),
            const_vec3!([ 0.0, 0.0, -1.0 ]),
            const_vec3!([ 0.0, 0.0, -1.0 ]),
            const_vec3!([ 0.0, 0.0, -1.0 ]),

            // Left face
            const_vec3!([ -1.0, 0.0, 0.0 ]),
            const_vec3!([ -1.0, 0.0, 0.0 ]),
            const_vec3!([ -1.0, 0.0, 0.0 ]),
            const_vec3!([ -1.0, 0.0, 0.0 ]),

            // Right face
            const_vec3!([ 1.0, 0.0, 0.0 ]),
            const_vec3!([ 1.0, 0.0, 0.0 ]),
            const_vec3!([ 1.0, 0.0, 0.0 ]),
            const_vec3!([ 1.0, 0.0, 0.0 ]),

            // Top face
            const_vec3!([ 0.0, 1.0, 0.0 ]),
            const_vec3!([ 0.0, 1.0, 0.0 ]),
            const_vec3!([ 0.0, 1.0, 0.0 ]),
            const_vec3!([ 0.0, 1.0, 0.0 ]),

            // Bottom face
            const_vec3!([ 0.0, -1.0, 0.0 ]),
            const_vec3!([ 0.0, -1.0, 0.0 ]),
            const_vec3!([ 0.0, -1.0, 0.0 ]),
            const_vec3!([ 0.0, -1.0, 0.0 ]),
        ];

        const INDICES : [u32;36] = [
            0, 1, 2, 0, 2, 3, // Front face
            4, 5, 6, 4, 6, 7, // Back face
            8, 9, 10, 8, 10, 11, // Left face
            12, 13, 14, 12, 14, 15, // Right face
            16, 17, 18, 16, 18, 19, // Top face
            20, 21, 22, 20, 22, 23 // Bottom face
        ];

        Obj{
            indices : INDICES.to_vec(),
            vertices : VERTICES.to_vec(),
            normals : NORMALS.to_vec(),
        }
    }

    /// The four-vertex pyramid from the first demo, with averaged normals
    /// so it also works under Phong shading.
    pub fn pyramid() -> Self {

        use glam::{
            Vec3,
            const_vec3,
        };

        const VERTICES : [Vec3;4] = [
            const_vec3!([ -0.5, -0.5, 0.0 ]),
            const_vec3!([  0.0, -0.5, 0.5 ]),
            const_vec3!([  0.5, -0.5, 0.0 ]),
            const_vec3!([  0.0,  0.5, 0.0 ]),
        ];

        const INDICES : [u32;12] = [
            0, 1, 3,
            1, 2, 3,
            0, 2, 3,
            0, 1, 2,
        ];

        let normals = average_normals(&VERTICES, &INDICES);

        Obj{
            indices : INDICES.to_vec(),
            vertices : VERTICES.to_vec(),
            normals,
        }
    }

    pub fn parse<R : io::BufRead> (mut r : R) -> Result<Obj, Error> {
        fn extract<'a, T, I>(
            line_num: usize,
            mut it : I,
            dst : &mut [T]
        ) -> Result<(), Error>
        where
            T : FromStr,
            <T as FromStr>::Err : std::fmt::Debug,
            I : Iterator<Item = &'a str>
        {
            for el in dst.iter_mut() {
                let s = it.next().ok_or(Error::ObjFormat(line_num))?;

                match FromStr::from_str(s) {
                    Ok(v) => {
                        *el = v;
                    },
                    Err(_) => {
                        return Err(Error::ObjFormat(line_num))
                    }
                }
            }

            Ok(())
        }

        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut vertex_indices = Vec::new();
        let mut normal_indices = Vec::new();


        let mut buf = String::new();
        let mut line_num = 0;

        loop {
            let n = r.read_line(&mut buf)?;
            if n == 0 {
                break;
            }

            line_num += 1;

            let mut it = buf.trim_end().split(' ');

            match it.next() {
                Some("v") => {
                    let mut vertex = Vec3::ZERO;
                    extract(line_num, it, vertex.as_mut())?;
                    vertices.push(vertex);
                },
                Some("vn") => {
                    let mut normal = Vec3::ZERO;
                    extract(line_num, it, normal.as_mut())?;
                    normals.push(normal);
                },
                Some("f") => {

                    let pairs = it
                        .take(3)
                        .map(|s| {
                            s.split_once("//").map(|(x, y)| [x, y])
                        })
                        .take_while(Option::is_some)
                        .flat_map(Option::unwrap);

                    let mut nums = [0usize; 6];
                    extract(line_num, pairs, &mut nums)?;
                    for i in 0..3 {
                        vertex_indices.push(nums[2*i]);
                        normal_indices.push(nums[2*i+1]);
                    }
                },
                Some("g" | "#" | "\n" | "") => {}, // ignore for now
                Some(s) if s.starts_with('#') => {},
                _ => return Err(Error::ObjFormat(line_num)),
            }

            buf.clear();
        }

        let n = vertex_indices.len();

        let mut ret = Obj{
            indices : Vec::with_capacity(n),
            vertices : Vec::with_capacity(n),
            normals : Vec::with_capacity(n),
        };

        for i in 0..n {
            let vi = vertex_indices[i].checked_sub(1)
                .and_then(|idx| vertices.get(idx))
                .ok_or(Error::ObjFormat(line_num))?;

            let ni = normal_indices[i].checked_sub(1)
                .and_then(|idx| normals.get(idx))
                .ok_or(Error::ObjFormat(line_num))?;

            ret.indices.push(i as u32);
            ret.vertices.push(*vi);
            ret.normals.push(*ni);
        }

        Ok(ret)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_triangle() {
        let src = "\
# a single triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1
";

        let obj = Obj::parse(Cursor::new(src)).unwrap();

        assert_eq!(obj.indices, vec![0, 1, 2]);
        assert_eq!(obj.vertices.len(), 3);
        assert_eq!(obj.normals, vec![Vec3::Z; 3]);
    }

    #[test]
    fn parse_rejects_bad_index() {
        let src = "\
v 0.0 0.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1
";

        assert!(matches!(
            Obj::parse(Cursor::new(src)),
            Err(Error::ObjFormat(_)),
        ));
    }

    #[test]
    fn parse_rejects_unknown_record() {
        let src = "q 1 2 3\n";

        assert!(matches!(
            Obj::parse(Cursor::new(src)),
            Err(Error::ObjFormat(1)),
        ));
    }

    #[test]
    fn pyramid_normals_are_unit_length() {
        let obj = Obj::pyramid();

        assert_eq!(obj.normals.len(), obj.vertices.len());

        for n in obj.normals.iter() {
            assert!((n.length() - 1.0).abs() < 1e-5);
        }

        // the apex normal points up
        assert!(obj.normals[3].y > 0.0);
    }

    #[test]
    fn averaged_normals_of_ccw_triangle() {
        let vertices = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
        ];

        let normals = average_normals(&vertices, &[0, 1, 2]);

        for n in normals.iter() {
            assert!((*n - Vec3::Z).length() < 1e-5);
        }
    }
}
