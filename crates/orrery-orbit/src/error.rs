//! Orbit configuration error types.

/// Errors raised while building an orbit model from configuration.
///
/// All of these are detected at construction; a built model cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum OrbitError {
    /// No body without a parent.
    #[error("system has no root body")]
    MissingRoot,

    /// More than one body without a parent.
    #[error("system has multiple root bodies: '{first}' and '{second}'")]
    MultipleRoots { first: String, second: String },

    /// A body names a parent that does not exist.
    #[error("body '{body}' references unknown parent '{parent}'")]
    UnknownParent { body: String, parent: String },

    /// Parent links form a loop that never reaches the root.
    #[error("body '{body}' is part of a parent cycle")]
    Cycle { body: String },

    /// Two bodies share a name under the same parent. Flat records reference
    /// parents by name, so there a name must be unique across the whole list.
    #[error("duplicate body name '{name}'")]
    DuplicateName { name: String },

    /// Radius is not a positive finite number.
    #[error("body '{body}' has invalid radius {radius}")]
    InvalidRadius { body: String, radius: f64 },

    /// Orbit distance is negative or not finite.
    #[error("body '{body}' has invalid orbit distance {distance}")]
    InvalidDistance { body: String, distance: f64 },

    /// Angular speed is not finite.
    #[error("body '{body}' has invalid angular speed {speed}")]
    InvalidSpeed { body: String, speed: f64 },

    /// Failed to read a system file from disk.
    #[error("failed to read system file: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse system file: {0}")]
    Parse(#[source] ron::error::SpannedError),
}
