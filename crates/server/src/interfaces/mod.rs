mod args;

// re-export the public interface
pub use args::{ServeArgs, ServeArgsBuilder};
