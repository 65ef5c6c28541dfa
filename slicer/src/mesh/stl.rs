use std::{
    io::{Read, Write},
    iter::Enumerate,
    str::{self, Lines, SplitWhitespace},
};

use common::serde::SliceDeserializer;
use tracing::{debug, warn};

use crate::{
    geometry::Facet,
    mesh::{Mesh, ParseError},
    Pos,
};

/// Size of the opaque header at the start of a binary mesh.
const HEADER_SIZE: usize = 80;
/// Size of one binary facet record (normal + 3 vertices + attribute).
const FACET_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Ascii,
    Binary,
}

impl MeshFormat {
    /// Guesses the format of a mesh file. Some exporters start binary headers
    /// with `solid`, so a file whose size exactly matches its binary facet
    /// count is treated as binary even if it looks like text.
    pub fn detect(data: &[u8]) -> Self {
        if let Some(count) = data.get(HEADER_SIZE..HEADER_SIZE + 4) {
            let count = u32::from_le_bytes([count[0], count[1], count[2], count[3]]) as u64;
            if (HEADER_SIZE + 4) as u64 + count * FACET_SIZE as u64 == data.len() as u64 {
                return MeshFormat::Binary;
            }
        }

        if data.trim_ascii_start().starts_with(b"solid") {
            MeshFormat::Ascii
        } else {
            MeshFormat::Binary
        }
    }
}

/// Reads a whole mesh file, detecting whether it is text or binary.
pub fn load_mesh<T: Read>(mut reader: T) -> Result<Mesh, ParseError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let format = MeshFormat::detect(&data);
    let mesh = match format {
        MeshFormat::Ascii => Mesh::from_ascii(str::from_utf8(&data)?)?,
        MeshFormat::Binary => {
            let (mesh, plain) = Mesh::from_binary(&data)?;
            if !plain {
                warn!("Mesh has facet attributes set, they will be ignored");
            }
            mesh
        }
    };

    debug!("Loaded {format:?} mesh with {} facets", mesh.facet_count());
    Ok(mesh)
}

/// ```text
/// solid name
/// facet normal ni nj nk
///     outer loop
///         vertex v1x v1y v1z
///         vertex v2x v2y v2z
///         vertex v3x v3y v3z
///     endloop
/// endfacet
/// endsolid name
/// ```
impl Mesh {
    /// Parses a text mesh. Any unexpected keyword or malformed number fails
    /// the whole load. Facets with an all zero normal get one derived from
    /// their winding order.
    pub fn from_ascii(text: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(text);
        tokens.expect("solid")?;
        let name = tokens.rest_of_line();

        let mut facets = Vec::new();
        loop {
            match tokens.next() {
                Some("facet") => facets.push(ascii_facet(&mut tokens)?),
                Some("endsolid") => break,
                Some(found) => return Err(tokens.unexpected("facet", found)),
                None => return Err(tokens.end("endsolid")),
            }
        }

        Ok(Mesh::new(facets).with_name(name))
    }

    pub fn read_ascii<T: Read>(mut reader: T) -> Result<Self, ParseError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_ascii(&text)
    }

    /// Writes the mesh in the text format accepted by [`Mesh::from_ascii`].
    pub fn write_ascii<T: Write>(&self, mut writer: T) -> std::io::Result<()> {
        writeln!(writer, "solid {}", self.name)?;
        for facet in self.facets() {
            let n = facet.normal();
            writeln!(writer, "facet normal {} {} {}", n.x, n.y, n.z)?;
            writeln!(writer, "\touter loop")?;
            for v in facet.vertices() {
                writeln!(writer, "\t\tvertex {} {} {}", v.x, v.y, v.z)?;
            }
            writeln!(writer, "\tendloop")?;
            writeln!(writer, "endfacet")?;
        }
        writeln!(writer, "endsolid {}", self.name)?;
        Ok(())
    }
}

/// ```text
/// UINT8[80]    – Header                 - 80 bytes
/// UINT32       – Number of triangles    - 04 bytes
/// foreach triangle                      - 50 bytes
///     REAL32[3] – Normal vector         - 12 bytes
///     REAL32[3] – Vertex 1              - 12 bytes
///     REAL32[3] – Vertex 2              - 12 bytes
///     REAL32[3] – Vertex 3              - 12 bytes
///     UINT16    – Attribute byte count  - 02 bytes
/// end
/// ```
impl Mesh {
    /// Parses a little-endian binary mesh. Also returns whether every facet's
    /// attribute field was zero, non-zero values are used by some programs
    /// for colors which are not supported. As with text meshes, facets with
    /// an all zero normal get one derived from their winding order.
    pub fn from_binary(data: &[u8]) -> Result<(Self, bool), ParseError> {
        let mut des = SliceDeserializer::new(data);
        des.advance_by(HEADER_SIZE)?; // skip header
        let count = des.read_u32_le()? as usize;

        let mut facets = Vec::with_capacity(count.min(des.remaining() / FACET_SIZE));
        let mut plain = true;
        for _ in 0..count {
            let normal = binary_vector(&mut des)?;
            let vertices = [
                binary_vector(&mut des)?,
                binary_vector(&mut des)?,
                binary_vector(&mut des)?,
            ];
            plain &= des.read_u16_le()? == 0;
            facets.push(stored_facet(vertices, normal));
        }

        if !des.is_eof() {
            warn!("Ignoring {} bytes after the last facet", des.remaining());
        }

        Ok((Mesh::new(facets), plain))
    }

    pub fn read_binary<T: Read>(mut reader: T) -> Result<(Self, bool), ParseError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_binary(&data)
    }
}

fn binary_vector(des: &mut SliceDeserializer) -> Result<Pos, ParseError> {
    Ok(Pos::new(
        des.read_f32_le()?,
        des.read_f32_le()?,
        des.read_f32_le()?,
    ))
}

/// Parses everything after the `facet` keyword, up to and including
/// `endfacet`.
fn ascii_facet(tokens: &mut Tokens) -> Result<Facet, ParseError> {
    tokens.expect("normal")?;
    let normal = tokens.vector()?;

    tokens.expect("outer")?;
    tokens.expect("loop")?;
    let mut vertices = [Pos::zeros(); 3];
    for vertex in vertices.iter_mut() {
        tokens.expect("vertex")?;
        *vertex = tokens.vector()?;
    }
    tokens.expect("endloop")?;
    tokens.expect("endfacet")?;

    Ok(stored_facet(vertices, normal))
}

/// Many exporters write a zero normal and leave it to the reader.
fn stored_facet(vertices: [Pos; 3], normal: Pos) -> Facet {
    if normal == Pos::zeros() {
        Facet::from_vertices(vertices)
    } else {
        Facet::new(vertices, normal)
    }
}

/// Whitespace separated tokens that keep track of the line they came from.
struct Tokens<'a> {
    lines: Enumerate<Lines<'a>>,
    current: SplitWhitespace<'a>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            current: "".split_whitespace(),
            line: 0,
        }
    }

    /// Consumes whatever is left on the current line.
    fn rest_of_line(&mut self) -> String {
        self.current.by_ref().collect::<Vec<_>>().join(" ")
    }

    fn expect(&mut self, keyword: &'static str) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token == keyword => Ok(()),
            Some(found) => Err(self.unexpected(keyword, found)),
            None => Err(self.end(keyword)),
        }
    }

    fn number(&mut self) -> Result<f32, ParseError> {
        let token = self.next().ok_or_else(|| self.end("number"))?;
        token.parse().map_err(|_| ParseError::InvalidNumber {
            line: self.line,
            found: token.to_owned(),
        })
    }

    fn vector(&mut self) -> Result<Pos, ParseError> {
        Ok(Pos::new(self.number()?, self.number()?, self.number()?))
    }

    fn unexpected(&self, expected: &'static str, found: &str) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.line,
            expected,
            found: found.to_owned(),
        }
    }

    fn end(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedEnd {
            line: self.line,
            expected,
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            if let Some(token) = self.current.next() {
                return Some(token);
            }

            let (idx, line) = self.lines.next()?;
            self.line = idx + 1;
            self.current = line.split_whitespace();
        }
    }
}

#[cfg(test)]
mod tests {
    use common::config::VolumeConfig;
    use image::GrayImage;
    use nalgebra::Vector3;

    use super::MeshFormat;
    use crate::{
        mesh::{cuboid, load_mesh, Mesh, ParseError},
        slicer::{Slicer, INSIDE},
        Pos,
    };

    const SAMPLE: &str = "solid OpenSCAD_Model
  facet normal -1 -0 0
    outer loop
      vertex -53.97  53.97 0.79375
      vertex -53.97 -53.97 0
      vertex -53.97 -53.97 0.79375
    endloop
  endfacet
endsolid OpenSCAD_Model
";

    fn binary(facets: &[([f32; 12], u16)]) -> Vec<u8> {
        let mut out = b"solid binary header".to_vec();
        out.resize(80, 0);
        out.extend_from_slice(&(facets.len() as u32).to_le_bytes());
        for (values, attribute) in facets {
            values
                .iter()
                .for_each(|x| out.extend_from_slice(&x.to_le_bytes()));
            out.extend_from_slice(&attribute.to_le_bytes());
        }
        out
    }

    const TRIANGLE: [f32; 12] = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

    #[test]
    fn parse_sample() {
        let mesh = Mesh::from_ascii(SAMPLE).unwrap();
        assert_eq!(mesh.name(), "OpenSCAD_Model");
        assert_eq!(mesh.facet_count(), 1);

        let facet = &mesh.facets()[0];
        assert_eq!(facet.normal(), Pos::new(-1.0, 0.0, 0.0));
        assert_eq!(facet.vertices()[0], Pos::new(-53.97, 53.97, 0.79375));
        assert_eq!(facet.bounds().min, Pos::new(-53.97, -53.97, 0.0));
    }

    #[test]
    fn ascii_round_trip() {
        let mut mesh = cuboid(Pos::new(-1.5, 0.25, 0.0), Pos::new(2.0, 3.125, 7.3));
        mesh.translate(Pos::new(0.1, 0.2, 0.3));

        let mut text = Vec::new();
        mesh.write_ascii(&mut text).unwrap();
        let parsed = Mesh::read_ascii(text.as_slice()).unwrap();

        assert_eq!(parsed, mesh);
    }

    #[test]
    fn zero_normal_is_derived() {
        let text = SAMPLE.replace("normal -1 -0 0", "normal 0 0 0");
        let mesh = Mesh::from_ascii(&text).unwrap();
        let normal = mesh.facets()[0].normal();
        assert!((normal - Pos::new(-1.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn ascii_errors() {
        let err = Mesh::from_ascii(&SAMPLE.replace("outer loop", "outer lop")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { line: 3, expected: "loop", ref found } if found == "lop"
        ));

        // Only two vertices
        let two = SAMPLE.replace("      vertex -53.97 -53.97 0\n", "");
        let err = Mesh::from_ascii(&two).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { expected: "vertex", .. }
        ));

        let err = Mesh::from_ascii(&SAMPLE.replace("0.79375\n", "0.7x\n")).unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { line: 4, .. }));

        let err = Mesh::from_ascii(&SAMPLE.replace("endsolid OpenSCAD_Model", "")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedEnd {
                expected: "endsolid",
                ..
            }
        ));

        let err = Mesh::from_ascii("mesh\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { line: 1, expected: "solid", .. }
        ));

        let err = Mesh::from_ascii(&SAMPLE.replace("facet normal", "facet nrmal")).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { line: 2, .. }));
    }

    #[test]
    fn parse_binary() {
        let data = binary(&[(TRIANGLE, 0), (TRIANGLE.map(|x| x * 2.0), 0)]);
        let (mesh, plain) = Mesh::from_binary(&data).unwrap();

        assert!(plain);
        assert_eq!(mesh.facet_count(), 2);
        assert_eq!(mesh.facets()[1].normal(), Pos::new(0.0, 0.0, 2.0));
        assert_eq!(mesh.facets()[1].vertices()[2], Pos::new(0.0, 2.0, 0.0));

        let data = binary(&[(TRIANGLE, 0), (TRIANGLE, 0x8000)]);
        let (_, plain) = Mesh::read_binary(data.as_slice()).unwrap();
        assert!(!plain);
    }

    fn binary_mesh(mesh: &Mesh, zero_normals: bool) -> Vec<u8> {
        let facets = (mesh.facets().iter())
            .map(|facet| {
                let normal = if zero_normals {
                    Pos::zeros()
                } else {
                    facet.normal()
                };
                let mut values = [0.0; 12];
                for (i, point) in [normal].iter().chain(facet.vertices()).enumerate() {
                    values[i * 3..i * 3 + 3].copy_from_slice(point.as_slice());
                }
                (values, 0)
            })
            .collect::<Vec<_>>();
        binary(&facets)
    }

    #[test]
    fn binary_zero_normals_are_derived() {
        let cube = cuboid(Pos::new(-2.0, -3.0, 0.0), Pos::new(4.0, 2.0, 6.0));
        let config = VolumeConfig::centered(
            Vector3::new(20, 20, 20),
            Vector3::repeat(20.0),
            Vector3::repeat(1.0),
        );

        let render = |mesh: Mesh| {
            let mut image = GrayImage::new(20, 20);
            assert!(Slicer::new(mesh, config.clone()).render(&mut image, 1.5));
            image
        };

        let (with_normals, _) = Mesh::from_binary(&binary_mesh(&cube, false)).unwrap();
        let (zero_normals, _) = Mesh::from_binary(&binary_mesh(&cube, true)).unwrap();
        for (facet, expected) in zero_normals.facets().iter().zip(cube.facets()) {
            assert!((facet.normal() - expected.normal()).norm() < 1e-6);
        }

        let expected = render(with_normals);
        assert_eq!(expected.pixels().filter(|x| x.0[0] == INSIDE).count(), 6 * 5);
        assert_eq!(render(zero_normals), expected);
    }

    #[test]
    fn truncated_binary() {
        let mut data = binary(&[(TRIANGLE, 0), (TRIANGLE, 0)]);
        data.truncate(data.len() - 3);
        assert!(matches!(
            Mesh::from_binary(&data),
            Err(ParseError::Truncated(_))
        ));
        assert!(matches!(
            Mesh::from_binary(&[0; 40]),
            Err(ParseError::Truncated(_))
        ));
    }

    #[test]
    fn detect_format() {
        // Starts with `solid` but the size matches the facet count
        let data = binary(&[(TRIANGLE, 0)]);
        assert_eq!(MeshFormat::detect(&data), MeshFormat::Binary);
        assert_eq!(load_mesh(data.as_slice()).unwrap().facet_count(), 1);

        assert_eq!(MeshFormat::detect(SAMPLE.as_bytes()), MeshFormat::Ascii);
        assert_eq!(MeshFormat::detect(b"  \nsolid x"), MeshFormat::Ascii);
        assert_eq!(MeshFormat::detect(&[0; 10]), MeshFormat::Binary);

        let mesh = load_mesh(SAMPLE.as_bytes()).unwrap();
        assert_eq!(mesh.name(), "OpenSCAD_Model");
    }
}
