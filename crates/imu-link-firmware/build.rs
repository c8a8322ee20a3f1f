fn main() {
    // Wi-Fi credentials may live in a `.env` next to this manifest. Values
    // already set in the environment win over the file.
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-env-changed=IMU_LINK_SSID");
    println!("cargo:rerun-if-env-changed=IMU_LINK_PASSWORD");

    if let Ok(entries) = dotenvy::dotenv_iter() {
        for (key, value) in entries.flatten() {
            if key.starts_with("IMU_LINK_") && std::env::var_os(&key).is_none() {
                println!("cargo:rustc-env={key}={value}");
            }
        }
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
