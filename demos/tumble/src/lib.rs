use wasm_bindgen::prelude::*;

mod scene;
pub use scene::Tumble;

tether_web::export_sandbox!(Tumble, "tumble");
