pub mod doe;
pub mod optimize;
pub mod runs;
pub mod serve;
