mod label;
mod migration;
mod product;
mod rack;

pub use label::*;
pub use migration::*;
pub use product::*;
pub use rack::*;
