pub mod latest;
pub mod single_image;
