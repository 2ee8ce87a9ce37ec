//! Core event model, template interpolator, module contracts and
//! registries shared by every other crate in the Spartan workspace.

pub mod error;
pub mod event;
pub mod interface_map;
pub mod registry;
pub mod template;
pub mod traits;
pub mod value;

pub use error::CoreError;
pub use event::Event;
pub use interface_map::InterfaceMap;
pub use registry::{CodecRegistry, Registry, RegistryError};
pub use traits::{Codec, Filter, Flushable, Input, Output};
pub use value::Value;
