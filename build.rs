fn main() {
    // Only the device build links against ESP-IDF; host builds use the
    // simulated board and need no environment from embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
