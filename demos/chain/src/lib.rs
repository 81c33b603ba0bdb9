use wasm_bindgen::prelude::*;

mod scene;
pub use scene::Chains;

tether_web::export_sandbox!(Chains, "chain");
