pub mod cli;
pub mod collect;
pub mod error;
pub mod github;
pub mod model;
pub mod render;
pub mod report;
pub mod util;
