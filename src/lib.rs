//! **romkit** - a library for reading ROM images, executables and texture
//! containers.
//!
//! # Supported formats
//! | Module | Format |
//! |--------|--------|
//! | [`formats::nds`] | NDS - Nintendo DS / DSi ROM image |
//! | [`formats::ne`]  | NE - 16-bit Windows / OS/2 executable |
//! | [`formats::dds`] | DDS - DirectDraw Surface texture |
//! | [`formats::ktx`] | KTX - Khronos texture |
//!
//! [`formats::open`] picks the parser from the file's leading bytes.
//! Textures decode through [`texture::decode`] into a [`texture::Raster`];
//! every container describes itself as a [`fields::Fields`] list.
//!
//! # Features
//! * `decryption` (default) - NDS secure-area encryption through
//!   [`crypto::ndscrypt`], using a key loaded by [`keys::NdsBlowfishKey`].

pub mod crypto;
pub mod error;
pub mod fields;
pub mod file;
pub mod formats;
pub mod hash;
pub mod keys;
pub mod texture;
pub mod utils;

pub use error::{Error, Result};
