pub mod levels;
pub mod render;
pub mod serve;
pub mod suggest;
