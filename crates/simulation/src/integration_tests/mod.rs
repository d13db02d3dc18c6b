//! Cross-subsystem scenario tests, driven through the public facade.

mod determinism;
mod power_oracle;
mod scenarios;
mod traffic_fuzz;
