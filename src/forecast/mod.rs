//! PV production forecasting: time grid, weather acquisition and caching,
//! cloud-cover irradiance adjustment, and the pipeline that ties them to the
//! solar geometry.

pub mod cache;
pub mod engine;
pub mod irradiance;
pub mod summary;
pub mod timegrid;
pub mod weather;
