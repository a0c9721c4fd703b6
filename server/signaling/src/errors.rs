use thiserror::Error;

pub type SignalingResult<T> = Result<T, SignalingError>;

#[derive(Error, Debug)]
pub enum SignalingError {
    #[error("Username already taken")]
    UsernameTaken,

    #[error("Missing group or username")]
    MissingRegisterFields,

    #[error("Missing call_id, to_user, from_group, or from_user")]
    MissingCallFields,

    #[error("User not found")]
    UserNotFound,

    #[error("Call ID already in use")]
    CallIdInUse,

    #[error("Call not found")]
    CallNotFound,

    #[error("User busy")]
    UserBusy,

    #[error("Missing call_id")]
    MissingCallId,
}
