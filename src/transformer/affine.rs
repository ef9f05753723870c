use crate::geom::{SubPath, Transform};

/// Applies an affine matrix to every vertex of the stream.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct AffineTransformer {
    pub matrix: Transform,
}

impl AffineTransformer {
    pub fn new(matrix: Transform) -> Self {
        Self { matrix }
    }

    pub fn apply(&self, mut sub_paths: Vec<SubPath>) -> Vec<SubPath> {
        if self.matrix.is_identity() {
            return sub_paths;
        }
        for sub in &mut sub_paths {
            for p in &mut sub.points {
                *p = self.matrix.transform_point(p);
            }
        }
        sub_paths
    }
}
