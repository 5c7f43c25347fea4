use thiserror::Error;

use rewire_driver::EffectError;
use rewire_store::StoreError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("no bound function at path '{0}'")]
    MissingFunction(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Effect(#[from] EffectError),
}
