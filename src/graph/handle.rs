//! Versioned handles to resources in a [`FrameGraph`](crate::FrameGraph).

use std::fmt::{Display, Formatter};

/// Versioned reference to a resource slot at a specific point in its write history.
///
/// Handles are plain values and can be copied freely. Every [`write`](crate::PassBuilder::write)
/// to a resource bumps the version of its slot and returns a new handle, after which all older handles to that
/// slot are stale. Two handles are only equal if both their index and version match.
///
/// A handle obtained from a failed builder call is [`ResourceHandle::INVALID`]. Use
/// [`FrameGraph::is_valid`](crate::FrameGraph::is_valid) to check whether a handle can still be read from.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct ResourceHandle {
    pub(crate) index: u16,
    pub(crate) version: u16,
}

impl ResourceHandle {
    /// The handle returned when a builder operation fails. It never refers to a resource.
    pub const INVALID: ResourceHandle = ResourceHandle {
        index: u16::MAX,
        version: 0,
    };

    pub(crate) fn new(index: u16, version: u16) -> Self {
        Self {
            index,
            version,
        }
    }

    /// Index of the resource slot this handle refers to.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Version of the resource this handle refers to. Starts at zero and increases by one on every write.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Returns false for [`ResourceHandle::INVALID`]. Note that an initialized handle can still be stale,
    /// only the graph can tell.
    pub fn is_initialized(&self) -> bool {
        self.index != u16::MAX
    }

    /// The handle that a successful write to this handle produces.
    pub(crate) fn next_version(&self) -> Self {
        Self {
            index: self.index,
            version: self.version + 1,
        }
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Display for ResourceHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_initialized() {
            write!(f, "#{}v{}", self.index, self.version)
        } else {
            f.write_str("#invalid")
        }
    }
}
