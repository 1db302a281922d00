pub mod assemble;
pub mod download;
pub mod plan;
