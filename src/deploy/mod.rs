//! Deployment - shuffle resolution, symlink creation, and install history

mod history;
mod link;
mod shuffle;

pub use history::*;
pub use link::*;
pub use shuffle::*;
