mod chord;
mod interp1d;
mod stats;
mod utm;

pub use chord::{chord_sample, ChordParams, ChordSamples, ResamplePoint};
pub use interp1d::{Interp1d, Mode};
pub(crate) use stats::{median, round_to};
pub use utm::{from_utm, to_utm};
