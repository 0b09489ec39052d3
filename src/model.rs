//! Value types flowing from the search API through to storage.

pub use highlight::*;
pub use timestamp::*;
pub use video_id::*;

mod highlight;
mod timestamp;
mod video_id;
