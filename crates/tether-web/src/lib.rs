pub mod runner;

pub use runner::SandboxRunner;

// Re-exported so the macro expansion does not depend on the caller's imports.
#[doc(hidden)]
pub use console_error_panic_hook;
#[doc(hidden)]
pub use console_log;
#[doc(hidden)]
pub use log;
#[doc(hidden)]
pub use tether_engine;

/// Generate all `#[wasm_bindgen]` exports for a sandbox scenario.
///
/// Generates:
/// - `thread_local!` storage for the SandboxRunner
/// - `with_runner()` helper function
/// - All wasm-bindgen exports (init, tick, pointer handlers, mesh accessors)
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
///
/// mod scene;
/// use scene::Tumble;
///
/// tether_web::export_sandbox!(Tumble, "tumble");
/// ```
///
/// # Arguments
///
/// - `$scenario_type`: a type implementing `tether_engine::Scenario` with a
///   `new()` constructor
/// - `$name`: a string literal used in the initialization log message
#[macro_export]
macro_rules! export_sandbox {
    ($scenario_type:ty, $name:literal) => {
        use std::cell::RefCell;

        thread_local! {
            static RUNNER: RefCell<Option<$crate::SandboxRunner<$scenario_type>>> = RefCell::new(None);
        }

        /// Runs `f` on the live runner; `None` before `sandbox_init()`.
        fn with_runner<R>(f: impl FnOnce(&mut $crate::SandboxRunner<$scenario_type>) -> R) -> Option<R> {
            RUNNER.with(|cell| {
                let mut borrow = cell.borrow_mut();
                match borrow.as_mut() {
                    Some(runner) => Some(f(runner)),
                    None => {
                        $crate::log::warn!("{}: sandbox_init() has not been called", $name);
                        None
                    }
                }
            })
        }

        #[wasm_bindgen]
        pub fn sandbox_init() {
            $crate::console_error_panic_hook::set_once();
            let _ = $crate::console_log::init_with_level($crate::log::Level::Info);

            let scenario = <$scenario_type>::new();
            let runner = $crate::SandboxRunner::new(scenario);

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });
            $crate::log::info!("{}: initialized", $name);
        }

        /// Advance by `dt` seconds of wall time and rebuild the mesh.
        #[wasm_bindgen]
        pub fn sandbox_tick(dt: f32) -> u32 {
            with_runner(|r| r.tick(dt)).unwrap_or(0)
        }

        // Pointer ids: negative for the mouse, the touch identifier otherwise.

        #[wasm_bindgen]
        pub fn sandbox_pointer_down(id: i32, x: f32, y: f32) {
            with_runner(|r| r.pointer_down(id, x, y));
        }

        #[wasm_bindgen]
        pub fn sandbox_pointer_move(id: i32, x: f32, y: f32) {
            with_runner(|r| r.pointer_move(id, x, y));
        }

        #[wasm_bindgen]
        pub fn sandbox_pointer_up(id: i32) {
            with_runner(|r| r.pointer_up(id));
        }

        #[wasm_bindgen]
        pub fn sandbox_set_debug_flags(joints: bool, contacts: bool, bounding_boxes: bool) {
            with_runner(|r| r.set_debug_flags(joints, contacts, bounding_boxes));
        }

        #[wasm_bindgen]
        pub fn sandbox_failed() -> bool {
            with_runner(|r| r.has_failed()).unwrap_or(false)
        }

        // ---- Mesh accessors ----

        #[wasm_bindgen]
        pub fn get_vertices_ptr() -> *const f32 {
            with_runner(|r| r.vertices_ptr()).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_vertex_count() -> u32 {
            with_runner(|r| r.vertex_count()).unwrap_or(0)
        }

        #[wasm_bindgen]
        pub fn get_vertex_stride_floats() -> u32 {
            $crate::tether_engine::MeshVertex::FLOATS as u32
        }

        #[wasm_bindgen]
        pub fn get_indices_ptr() -> *const u32 {
            with_runner(|r| r.indices_ptr()).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_index_count() -> u32 {
            with_runner(|r| r.index_count()).unwrap_or(0)
        }

        #[wasm_bindgen]
        pub fn get_shader_source() -> String {
            $crate::tether_engine::ANTIALIAS_WGSL.to_string()
        }

        // ---- Frame stats ----

        #[wasm_bindgen]
        pub fn get_fps() -> f32 {
            with_runner(|r| r.fps()).unwrap_or(0.0)
        }

        #[wasm_bindgen]
        pub fn get_last_steps() -> u32 {
            with_runner(|r| r.last_steps()).unwrap_or(0)
        }

        #[wasm_bindgen]
        pub fn get_alpha() -> f32 {
            with_runner(|r| r.alpha()).unwrap_or(0.0)
        }
    };
}
