#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavigationError {
    #[error("Invalid navigation config: {0}")]
    InvalidConfig(String),

    #[error("Unknown distance sensor '{0}'")]
    UnknownSensor(String),

    #[error("Missing distance sensor '{0}'")]
    MissingSensor(&'static str),
}
