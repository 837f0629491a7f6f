pub mod compile;
pub mod dump;
pub mod entries;
pub mod exec;
pub mod index;
pub mod load;
pub mod render;
