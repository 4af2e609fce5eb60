pub mod detection;

pub use detection::{is_hdr, normalize_primaries, normalize_transfer};
