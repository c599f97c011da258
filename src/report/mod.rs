pub mod models;
pub mod writer;

pub use models::ScanRow;
pub use writer::{render_top, write_csv};
