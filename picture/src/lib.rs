//!
//! # flo_picture
//!
//! `flo_picture` records 2D drawing operations into a sealed `Picture`, writes pictures to a versioned binary
//! format, and reads them back so they can be replayed against any drawing surface.
//!
//! Drawing is recorded by sending calls to a `Recorder`, which implements the `Surface` trait. The recorder stores
//! each call as an op in a byte stream, and keeps the paints, paths, images and text blobs that the ops refer to in
//! side tables so that repeated values are only stored once. `finish_recording()` seals the result into a
//! `Picture`, which can then be played back against another `Surface` or encoded with `Picture::encode()`.
//!
//! `decode_picture()` reads a picture from bytes. The data is never trusted: every read is bounds-checked, every
//! count is validated before it's used, and nested pictures are limited to a fixed depth. Effects (shaders, color
//! filters, image filters and so on) are polymorphic in the format and are decoded by name through a registry.
//! Effects that are known but can't be replayed are dropped from the picture rather than rejecting it, as long as
//! their data can be safely skipped.
//!
//! Pictures written by older versions of the format can be read, back to the oldest version listed in `Version`.
//! Pictures are always written in the current version.
//!
//! Logging goes through the `log` crate: this library doesn't install a logger itself.
//!

#![warn(bare_trait_objects)]

#[macro_use]
extern crate serde_derive;

extern crate futures;

mod error;
mod version;
mod options;
mod stream;
mod tables;
mod flat;
mod read_cursor;
mod write_cursor;
mod geometry;
mod typeface;
mod path;
mod image;
mod paint;
mod font;
mod text_blob;
mod effects;
mod draw_type;
mod surface;
mod recorder;
mod playback;
mod picture;
mod playback_stream;

pub use self::error::*;
pub use self::version::*;
pub use self::options::*;
pub use self::stream::*;
pub use self::tables::*;
pub use self::flat::*;
pub use self::read_cursor::*;
pub use self::write_cursor::*;
pub use self::geometry::*;
pub use self::typeface::*;
pub use self::path::*;
pub use self::image::*;
pub use self::paint::*;
pub use self::font::*;
pub use self::text_blob::*;
pub use self::effects::*;
pub use self::draw_type::*;
pub use self::surface::*;
pub use self::recorder::*;
pub use self::picture::*;
pub use self::playback_stream::*;
