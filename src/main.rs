//! Browser entry point. Trunk builds this binary for `wasm32`; on other
//! targets it only points at the test suite.

fn main() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
        if let Err(e) = catvid_clicker::web::boot() {
            log::error!("Clicker failed to start: {}", e);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("catvid_clicker runs in the browser; use `cargo test` for the native core.");
}
