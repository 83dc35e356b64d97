//! Terminal stand-in for browser navigation.

use async_trait::async_trait;
use url::Url;

use tern_core::{Navigator, Result};

/// Prints the authorization URL and ends the process, the way a browser
/// redirect leaves the current page.
pub struct PrintNavigator;

#[async_trait]
impl Navigator for PrintNavigator {
    async fn navigate(&self, url: &Url) -> Result<()> {
        println!("Open this URL in a browser to authorize tern:");
        println!();
        println!("  {}", url);
        std::process::exit(0)
    }
}
