pub mod calculate_volatility;
pub mod incremental_update;
pub mod resample;

#[cfg(test)]
mod resample_test;
