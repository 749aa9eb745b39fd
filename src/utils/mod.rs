pub mod download;

pub use download::save_generated;
