pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = match option_env!("BUILD_COMMIT") {
    Some(c) => c,
    None => "unknown",
};

/// Version string including the commit the binary was built from.
pub fn version_string() -> String {
    format!("{} (commit: {})", VERSION, COMMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_crate_version() {
        assert!(version_string().starts_with(VERSION));
        assert!(version_string().contains("commit:"));
    }
}
