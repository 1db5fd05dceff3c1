fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (`--no-default-features`) run the pure-logic test suite
    // without the ESP-IDF toolchain environment.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
