//! Convert Mixamo FBX animations into VRM Animation (`.vrma`) files.
//!
//! The [`convert`] module holds the scene-to-VRMA transform. [`pipeline`]
//! wires it to the FBX2glTF decoder and the filesystem.

pub mod container;
pub mod convert;
pub mod decoder;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod settings;

pub use error::ConvertError;
