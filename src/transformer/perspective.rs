use crate::geom::SubPath;

/// Reserved transformer kind.
///
/// The format reserves a tag for perspective warps but defines no payload;
/// decoders accept the tag and this placeholder passes geometry through
/// unchanged. Encoders never emit it.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PerspectiveTransformer;

impl PerspectiveTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, sub_paths: Vec<SubPath>) -> Vec<SubPath> {
        sub_paths
    }
}
