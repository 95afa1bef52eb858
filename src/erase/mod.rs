//! Region erasure module
//!
//! # Modes
//!
//! - **Mean fill** ([`fill`]) - paint each region with the average color
//!   sampled from inside it (paired with contour bubble detection)
//! - **Whiteout** ([`whiteout`]) - paint each region pure white (paired with
//!   OCR box location)

pub mod fill;
pub mod whiteout;

// Re-export public API
pub use fill::{erase_fill, fill_in_place, FillOptions};
pub use whiteout::{erase_whiteout, whiteout_in_place};
