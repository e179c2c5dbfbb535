use std::time::Duration;

/// Configuration for browser sessions
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Relax OS sandboxing (`--no-sandbox`); required in most containers
    pub disable_sandbox: bool,

    /// Upper bound on browser process start / CDP handshake, in seconds
    pub launch_timeout_secs: u64,

    /// Browser window size
    pub window_size: (u32, u32),

    /// Custom user agent
    pub user_agent: Option<String>,

    /// Disable image loading for performance
    pub disable_images: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            disable_sandbox: true,
            launch_timeout_secs: 30,
            window_size: (1920, 1080),
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            disable_images: true,
        }
    }
}

impl BrowserConfig {
    /// Get the launch bound as a Duration
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert!(config.disable_sandbox);
        assert_eq!(config.window_size, (1920, 1080));
        assert!(config.user_agent.is_some());
        assert_eq!(config.launch_timeout(), Duration::from_secs(30));
    }
}
