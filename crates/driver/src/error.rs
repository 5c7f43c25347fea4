use thiserror::Error;

#[derive(Debug, Error)]
pub enum EffectError {
    #[error("trying to {op} but no store is bound to this context")]
    NoStore { op: &'static str },

    #[error("no mock registered for call target `{0}` (strict mode)")]
    UnmockedCall(String),

    #[error("call target `{target}` failed: {message}")]
    Call { target: String, message: String },

    #[error("action channel closed while waiting to take an action")]
    ChannelClosed,

    #[error("race requires at least one effect")]
    EmptyRace,
}

impl EffectError {
    /// Failure of a named call target, for use inside substitutes and
    /// real implementations.
    pub fn call(target: impl Into<String>, message: impl Into<String>) -> Self {
        EffectError::Call {
            target: target.into(),
            message: message.into(),
        }
    }
}
