pub mod bootstrap;
pub mod fit;
pub mod simulate;
