pub mod meter;
pub mod monitoring;
pub mod outputs;
pub mod power_flow;
pub mod run_token;
pub mod yearly_totals;
