pub mod gesture;
pub mod viewport;

pub use gesture::GestureRecognizer;
pub use viewport::{ViewportController, ViewportState};
