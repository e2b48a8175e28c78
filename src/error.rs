use thiserror::Error;

#[derive(Debug, Error)]
pub enum GevError {
    #[error("Scale parameter sigma must be positive and finite, got {value} at index {index}")]
    InvalidScale { index: usize, value: f64 },

    #[error("Shape parameter xi must be greater than -0.5, got {value} at index {index}")]
    InvalidShape { index: usize, value: f64 },

    #[error("Location parameter mu must be finite, got {value} at index {index}")]
    InvalidLocation { index: usize, value: f64 },

    #[error("Response must be finite, got {value} at index {index}")]
    InvalidResponse { index: usize, value: f64 },

    #[error("Observation {index} (y = {y}) lies outside the support of the GEV distribution")]
    OutsideSupport { index: usize, y: f64 },

    #[error("Probability must lie in [0, 1], got {value} at index {index}")]
    InvalidProbability { index: usize, value: f64 },

    #[error("{param} = {value} at index {index} is outside the domain of the {link} link")]
    OutsideLinkDomain {
        param: String,
        link: String,
        index: usize,
        value: f64,
    },

    #[error("Unknown link function '{name}'")]
    UnknownLink { name: String },

    #[error("Link '{link}' cannot be used for parameter '{param}' (allowed: {allowed})")]
    UnsupportedLink {
        param: String,
        link: String,
        allowed: String,
    },

    #[error("Unknown parameter '{param}' for distribution {distribution}")]
    UnknownParameter { distribution: String, param: String },

    #[error("No values supplied for parameter '{param}'")]
    MissingParameter { param: String },

    #[error("Length mismatch for '{name}': expected {expected} (or 1), got {found}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("At least {required} observations are needed, got {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Linear algebra error: {0}")]
    Linalg(String),

    #[error("Invalid input: {0}")]
    Input(String),
}
