pub mod compass;
pub mod contour;
pub mod format;
pub mod models;
pub mod placement;
