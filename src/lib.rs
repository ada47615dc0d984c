pub mod feed;
pub mod legend;
pub mod map;
pub mod output;
pub mod render;
pub mod style;
