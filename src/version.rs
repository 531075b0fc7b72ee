//! Version information.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `User-Agent` sent to HTTP backends: `huginn/{version}`.
pub fn user_agent() -> String {
    format!("{}/{PKG_VERSION}", env!("CARGO_PKG_NAME"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_contains_pkg_version() {
        let agent = user_agent();
        assert!(agent.starts_with("huginn/"));
        assert!(agent.ends_with(PKG_VERSION));
    }
}
