// hdr-tonemap: luminance-domain tone mapping for HDR images
//
// Stages, leaf-first:
//   kernel → convolution → luminance → tone → reconstruct → pipeline
//
// convert / io / error are the plumbing the viewer binary needs.

pub mod error;
pub mod image;
pub mod kernel;
pub mod convolution;
pub mod luminance;
pub mod tone;
pub mod reconstruct;
pub mod pipeline;
pub mod convert;
pub mod io;

pub use crate::error::{Error, Result};
pub use crate::image::{Image, PixelField, Rgba, ScalarField};
pub use crate::kernel::Kernel;
pub use crate::pipeline::{run_tone_mapping, Request, Session, ToneMapConfig};
pub use crate::tone::ToneMode;
