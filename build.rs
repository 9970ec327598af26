fn main() {
    // The desktop shell needs the generated Tauri context; the core state
    // machine builds without it.
    #[cfg(feature = "desktop")]
    tauri_build::build()
}
