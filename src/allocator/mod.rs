//! The allocator module defines how the frame graph obtains backing storage for its resources.
//! <br>
//! <br>
//! # Allocator traits
//! These are defined in [`traits`], and can be implemented to plug any texture backend into the frame graph.
//! # Headless allocator
//! An allocator that hands out unique ids instead of GPU textures, see [`headless`].

pub mod traits;
pub mod headless;
