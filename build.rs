fn main() {
    println!("cargo:rerun-if-env-changed=FIREBASE_HOST");
    println!("cargo:rerun-if-env-changed=FIREBASE_AUTH");
    println!("cargo:rerun-if-env-changed=WIFI_SSID");
    println!("cargo:rerun-if-env-changed=WIFI_PASS");

    // ESP-IDF link arguments are only needed for the on-target binary.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
