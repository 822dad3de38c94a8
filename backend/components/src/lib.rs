pub mod registry;

pub use registry::{
    ComponentError, ComponentHandler, ComponentInteraction, ComponentKind, ComponentRegistry,
    ComponentStats, DEFAULT_TIMEOUT,
};
