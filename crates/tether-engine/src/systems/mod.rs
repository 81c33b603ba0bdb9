pub mod debug;
pub mod styler;
pub mod vector;
