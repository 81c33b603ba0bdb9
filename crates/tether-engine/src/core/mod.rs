pub mod breakable;
pub mod contacts;
pub mod driver;
pub mod geometry;
pub mod physics;
pub mod shapes;
pub mod time;
