mod gesture;
mod highlight;
mod hit_grid;
mod viewport;

pub use gesture::{GestureController, GestureEvent, GestureKind, GesturePolicy};
pub use highlight::Highlight;
pub use hit_grid::HitGrid;
pub use viewport::{ViewConfig, ViewTransform};
