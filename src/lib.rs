pub mod analyze;
pub mod dataset;
pub mod http;
pub mod mapping;
pub mod normalize;
pub mod table;
