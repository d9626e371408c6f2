use thiserror::Error;

/// Errors raised by the scene-to-VRMA transform and the container packer.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("framerate must be a positive integer (got {0})")]
    InvalidFramerate(i64),

    #[error(
        "animation {animation} channel {channel} references sampler {sampler}, but the animation has {sampler_count} sampler(s)"
    )]
    SamplerOutOfRange {
        animation: usize,
        channel: usize,
        sampler: u64,
        sampler_count: usize,
    },

    #[error("animation {animation} channel {channel} has no sampler index")]
    MissingSampler { animation: usize, channel: usize },

    #[error("buffer {buffer} has an invalid data URI: {reason}")]
    InvalidDataUri { buffer: usize, reason: String },

    #[error("failed to serialize VRMA JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("container of {0} bytes exceeds the 4 GiB GLB limit")]
    ContainerTooLarge(usize),

    #[error("container length mismatch: expected {expected} bytes, wrote {actual}")]
    ContainerLengthMismatch { expected: usize, actual: usize },

    #[error("malformed GLB container: {0}")]
    Container(#[from] gltf::Error),
}
