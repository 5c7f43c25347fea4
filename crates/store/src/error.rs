use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("composite reducer requires a map-shaped state tree, got {0}")]
    CompositeState(&'static str),
}
