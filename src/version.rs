/// Build version. `APP_VERSION` set at compile time wins over the crate version.
pub const VERSION: &str = match option_env!("APP_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
