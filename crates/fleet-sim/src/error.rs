use fleet_core::CoreError;
use fleet_dispatch::DispatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("engine configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("the road graph has no connected nodes")]
    EmptyGraph,

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("driver thread panicked")]
    DriverPanicked,
}

pub type SimResult<T> = Result<T, SimError>;
