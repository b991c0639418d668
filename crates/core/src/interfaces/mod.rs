mod args;

// re-export the public interface
pub use args::{
    ExplainArgs, ExplainArgsBuilder, ProviderArgs, ProviderArgsBuilder, SimulateArgs,
    SimulateArgsBuilder, TxArgs, TxArgsBuilder,
};
