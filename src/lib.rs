//! # camsnap
//!
//! Single-frame webcam capture for Windows.
//!
//! Opens the first video capture device through Media Foundation, negotiates
//! a 24-bit or 32-bit RGB stream (falling back to whatever the device reports),
//! discards the first few frames while the sensor settles, and returns one
//! tightly packed BGR24 image. The image can then be written as BMP or JPEG.
//!
//! ## Rust usage
//!
//! ```no_run
//! use camsnap::{capture, image, output, pipeline};
//!
//! capture::initialize().unwrap();
//! let frame = pipeline::capture();
//! capture::teardown();
//!
//! let frame = frame.unwrap();
//! let name = output::generate_filename(output::OutputFormat::Jpeg, output::DEFAULT_NAME_BUDGET)
//!     .unwrap();
//! image::save(std::path::Path::new(&name), &frame, image::DEFAULT_QUALITY).unwrap();
//! ```
//!
//! On other platforms the crate builds, but `capture::initialize` reports
//! that no capture runtime is available.

pub mod capture;
pub mod image;
pub mod output;
pub mod pipeline;
