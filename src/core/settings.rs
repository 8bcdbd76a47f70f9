//! Exposes the settings used to configure a [`FrameGraph`](crate::FrameGraph).

/// Settings for a frame graph. Obtain these through a [`GraphSettingsBuilder`], or use the default.
#[derive(Debug, Clone)]
pub struct GraphSettings {
    /// Name of the graph, used in log messages.
    pub name: String,
    /// Re-check structural invariants during compile and panic when they are violated. Defaults to
    /// on in debug builds. With validation off, violations are only logged.
    pub enable_validation: bool,
    /// Log every culled pass at debug level.
    pub log_culled_passes: bool,
    /// Expected amount of passes per frame. Used to preallocate storage.
    pub pass_capacity: usize,
    /// Expected amount of resources per frame. Used to preallocate storage.
    pub resource_capacity: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            name: String::from("frame graph"),
            enable_validation: cfg!(debug_assertions),
            log_culled_passes: true,
            pass_capacity: 16,
            resource_capacity: 32,
        }
    }
}

/// The settings builder is a convenience struct to easily create [`GraphSettings`].
///
/// # Example
/// ```
/// use deimos::prelude::*;
///
/// let settings = GraphSettingsBuilder::new()
///     .name("main view")
///     .validation(true)
///     .capacity(32, 64)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct GraphSettingsBuilder {
    inner: GraphSettings,
}

impl GraphSettingsBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the graph name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    /// Enable or disable compile-time validation.
    pub fn validation(mut self, enabled: bool) -> Self {
        self.inner.enable_validation = enabled;
        self
    }

    /// Enable or disable logging of culled passes.
    pub fn log_culled_passes(mut self, enabled: bool) -> Self {
        self.inner.log_culled_passes = enabled;
        self
    }

    /// Set the expected amount of passes and resources per frame.
    pub fn capacity(mut self, passes: usize, resources: usize) -> Self {
        self.inner.pass_capacity = passes;
        self.inner.resource_capacity = resources;
        self
    }

    /// Build the settings.
    pub fn build(self) -> GraphSettings {
        self.inner
    }
}
