pub mod codec;
pub mod data;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod progress;
