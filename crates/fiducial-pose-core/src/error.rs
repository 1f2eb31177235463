/// Errors raised when geometric preconditions are violated.
///
/// These never propagate NaN or garbage pixels downstream; a malformed input
/// surfaces as an explicit failure at the call site.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("matrix is not a proper rotation (det = {det:.6})")]
    NotARotation { det: f64 },
    #[error("quaternion pivot selection failed on an inconsistent rotation matrix")]
    PivotSelection,
    #[error("point has zero depth after projection")]
    DegenerateDepth,
}
