use thiserror::Error;

/// Top level error for study analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    ContourParse(#[from] ContourParseError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Distance(#[from] DistanceError),

    #[error(transparent)]
    Beam(#[from] BeamError),
}

/// Canonical contour text could not be parsed. Always fatal for the structure it belongs to.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContourParseError {
    #[error("record {record} is empty")]
    EmptyRecord { record: usize },

    #[error("record {record}: '{token}' is not a number")]
    InvalidNumber { record: usize, token: String },

    #[error("record {record}: slice position {z} is not finite")]
    NonFiniteZ { record: usize, z: f64 },

    #[error("record {record}: expected z followed by x/y pairs, found {value_count} values")]
    UnpairedCoordinates { record: usize, value_count: usize },
}

/// Geometry could not be evaluated. Recovered as a missing metric by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("non-finite coordinate ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    #[error("structure has no slices with area")]
    EmptyStructure,

    #[error("geometry has zero area")]
    ZeroArea,

    #[error("failed to build spatial index: {0}")]
    SpatialIndex(String),
}

/// Distance calculation could not be performed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistanceError {
    #[error("{oar_points} x {target_points} point pairs exceed the limit of {limit}")]
    TooManyPairs {
        oar_points: usize,
        target_points: usize,
        limit: usize,
    },

    #[error("no surface points to measure from")]
    EmptyPointSet,

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Structural fault in beam data. Recorded per beam, siblings continue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeamError {
    #[error("beam '{beam}' has no control points")]
    NoControlPoints { beam: String },

    #[error(
        "beam '{beam}' control point {control_point}: expected {expected} leaf positions per bank, found {found}"
    )]
    LeafCountMismatch {
        beam: String,
        control_point: usize,
        expected: usize,
        found: usize,
    },

    #[error("beam '{beam}' has no monitor units")]
    ZeroMonitorUnits { beam: String },

    #[error("beam '{beam}' has a final cumulative meterset weight of zero")]
    ZeroFinalWeight { beam: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Convenience type alias for results using [`AnalysisError`].
pub type Result<T> = std::result::Result<T, AnalysisError>;
