//! Index-based mesh types shared by the reducer and the frustum.

/// A polygon given by vertex indices into a shared vertex array.
pub type Face = Vec<usize>;

/// A directed edge between two vertex indices.
pub type Edge = (usize, usize);

/// Closed edge loop of a face: `(f[0], f[1]), (f[1], f[2]), ..., (f[n-1], f[0])`.
pub fn face_to_edges(face: &[usize]) -> Vec<Edge> {
    let n = face.len();
    (0..n).map(|i| (face[i], face[(i + 1) % n])).collect()
}

/// Edges of all faces, concatenated in face order.
pub fn faces_to_edges(faces: &[Face]) -> Vec<Edge> {
    faces.iter().flat_map(|f| face_to_edges(f)).collect()
}

/// Vertices plus an edge list.
///
/// The frustum only ever looks at mask edges, so this is all it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMesh<P> {
    /// Vertex positions.
    pub verts: Vec<P>,
    /// Edges indexing into `verts`.
    pub edges: Vec<Edge>,
}

impl<P> Default for EdgeMesh<P> {
    fn default() -> Self {
        Self {
            verts: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<P: Clone> EdgeMesh<P> {
    /// Create a mesh from vertices and edges.
    pub fn new(verts: Vec<P>, edges: Vec<Edge>) -> Self {
        Self { verts, edges }
    }

    /// Create a mesh from vertices and faces, keeping only the face edges.
    pub fn from_faces(verts: Vec<P>, faces: &[Face]) -> Self {
        Self {
            verts,
            edges: faces_to_edges(faces),
        }
    }

    /// Append another mesh, offsetting its edge indices past our vertices.
    pub fn add_mesh(&mut self, verts: &[P], edges: &[Edge]) {
        let offset = self.verts.len();
        self.verts.extend_from_slice(verts);
        self.edges
            .extend(edges.iter().map(|&(a, b)| (a + offset, b + offset)));
    }

    /// Endpoints of every edge.
    pub fn segments(&self) -> impl Iterator<Item = (&P, &P)> + '_ {
        self.edges
            .iter()
            .map(move |&(a, b)| (&self.verts[a], &self.verts[b]))
    }
}
