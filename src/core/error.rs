//! Exposes the deimos error type

use thiserror::Error;

/// Error type that deimos can return.
///
/// Errors made while declaring a graph are not returned to the caller directly. They are logged, and the offending
/// builder call returns [`ResourceHandle::INVALID`](crate::ResourceHandle::INVALID) instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The handle was never created by this graph, or is the invalid handle.
    #[error("Attempting to use an invalid resource handle.")]
    InvalidHandle,
    /// The handle refers to an older version of a resource that has since been written to.
    #[error("Attempting to use stale handle to resource `{name}` (version {found}, current version is {expected}).")]
    StaleHandle {
        /// Name of the resource
        name: String,
        /// The current version of the resource
        expected: u16,
        /// The version of the handle that was used
        found: u16,
    },
    /// No more resource slots can be created this frame.
    #[error("Too many resources in frame graph.")]
    TooManyResources,
    /// A resource was written to too many times this frame.
    #[error("Too many writes to resource `{0}`.")]
    TooManyVersions(String),
    /// No backing storage exists for a resource while executing a pass.
    #[error("No texture bound to resource `{0}`")]
    NoResourceBound(String),
    /// The resource allocator failed to create a texture.
    #[error("Failed to allocate texture for resource `{0}`")]
    AllocationFailed(String),
    /// The allocator was asked to destroy a texture it does not own.
    #[error("Texture `{0}` is not owned by this allocator.")]
    UnknownTexture(String),
    /// A resource move could not be recorded.
    #[error("Illegal resource move: {0}")]
    IllegalAlias(String),
    /// More than one pass produced the same version of a resource. This can only happen if the builder was bypassed.
    #[error("Resource `{0}` has multiple writers for the same version.")]
    MultipleWriters(String),
    /// A live pass uses a resource outside of the computed lifetime of that resource.
    #[error("Pass `{pass}` uses resource `{resource}` outside of its lifetime.")]
    OutsideLifetime {
        /// Name of the pass
        pass: String,
        /// Name of the resource
        resource: String,
    },
}
