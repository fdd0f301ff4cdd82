pub mod emergency;
pub mod temperature;
