mod request;

// re-export the public interface
pub use request::{BlockSpec, GasPriceSpec, GasSpec, SimulationRequest};
