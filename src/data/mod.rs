pub mod dataset;
pub mod price_series;
pub mod store;

#[cfg(test)]
pub mod memory_store;

#[cfg(test)]
mod store_test;
