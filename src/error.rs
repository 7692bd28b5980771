/// Process exit status for a normal shutdown.
pub const EXIT_OK: i32 = 0;
/// Process exit status after the usage text was requested.
pub const EXIT_HELP: i32 = 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArgError {
    #[error("No number passed to update interval argument")]
    MissingInterval,
    #[error("Passed update interval is not a valid number: {0:?}")]
    InvalidInterval(String),
}

impl ArgError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ArgError::MissingInterval => -1,
            ArgError::InvalidInterval(_) => -2,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Failed to initialize tracking runtime:\n{0}")]
    RuntimeUnavailable(String),
    #[error(
        "Controllers not found!\nThis error may also occur if the tracking runtime (SteamVR) is not running"
    )]
    ControllersNotFound,
}

impl SessionError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionError::RuntimeUnavailable(_) => -3,
            SessionError::ControllersNotFound => -4,
        }
    }
}
