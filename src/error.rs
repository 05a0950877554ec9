use std::fmt;
use thiserror::Error;

/// Which hook an effect fault came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Mount,
    Update,
    Unmount,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Mount => "mount",
            Phase::Update => "update",
            Phase::Unmount => "unmount",
        })
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown effect `{0}`")]
    UnknownEffect(String),

    #[error("output surface unavailable: {0}")]
    SurfaceMissing(String),

    #[error("effect `{name}` failed in {phase}: {message}")]
    EffectFault {
        name: String,
        phase: Phase,
        message: String,
    },

    #[error("effect `{name}` panicked in {phase}: {message}")]
    EffectPanicked {
        name: String,
        phase: Phase,
        message: String,
    },

    #[error("could not load effect `{path}`: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn is_effect_fault(&self) -> bool {
        matches!(
            self,
            CoreError::EffectFault { .. } | CoreError::EffectPanicked { .. }
        )
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string panic payload>".to_string())
}
