//! Lumina core - HDR images and textures.
//!
//! This crate provides:
//!
//! - **`HdrImage`**: the floating-point pixel buffer the renderer draws
//!   into, with logarithmic average luminosity, tone mapping and LDR
//!   export
//! - **PFM codec**: reading and writing the Portable Float Map format
//! - **Textures**: uniform, checkered and image-backed color sources

pub mod hdr_image;
pub mod pfm;
pub mod texture;

pub use hdr_image::{HdrImage, ImageError};
pub use pfm::{read_pfm, write_pfm, Endianness, PfmError};
pub use texture::{CheckeredTexture, ImageTexture, Texture, UniformTexture};
