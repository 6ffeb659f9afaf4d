//! # Disparity Computation
//!
//! This crate provides dense ZNCC disparity map computation for rectified stereo pairs.
//!
//! A run matches the pair with each image as reference in turn, cross-checks the two maps and
//! fills the pixels that failed the check from their neighbours:
//!
//! ```no_run
//! use zncc_disparity::prelude::*;
//! use zncc_disparity::zncc::{Params, Zncc};
//!
//! # fn main() -> zncc_disparity::Result<()> {
//! let frame = StereoFrame::open("left.png", "right.png")?;
//! let mut zncc = Zncc::new(Params::default());
//! zncc.compute(&frame)?.to_luma_normalised().save("disparity.png")?;
//! # Ok(())
//! # }
//! ```

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod disparity;
mod error;
mod frame;
mod schedule;
pub mod consistency;
pub mod occlusion;
pub mod preprocess;
pub mod zncc;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::disparity::{normalise_value, DisparityAlgorithm, DisparityMap, DisparityStats};
    pub use crate::frame::{Direction, StereoFrame};
    pub use crate::schedule::Schedule;
}
