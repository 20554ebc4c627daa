#![forbid(unsafe_code)]

mod render;

pub use render::{init_tracing, render_tags_ascii, render_walkability_ascii};
