//! PhotoSphere core: scan a folder of images into an immutable album tree
//! and walk it with a stack-based navigator. The GUI binary layers an
//! orbitable sphere view on top; everything here is renderer-free.

pub mod navigator;
pub mod orbit_camera;
pub mod scanner;
pub mod session;
pub mod sphere_layout;
pub mod tree;
