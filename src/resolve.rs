use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use url::Url;

/// Share wrapper whose `redirectUrl` query parameter carries the real
/// product page.
const SHARE_REDIRECT_HOST: &str = "star.aliexpress.com";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

/// Follows shortened/wrapped links through their redirect chain.
pub struct LinkResolver {
    client: reqwest::Client,
}

impl LinkResolver {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_secs(10))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("failed to build redirect-following client")?;
        Ok(Self { client })
    }

    /// Final URL after following all redirects. Network failure returns the
    /// input unchanged; downstream must tolerate an unresolved link.
    pub async fn resolve(&self, link: &str) -> String {
        match self.follow(link).await {
            Ok(resolved) => {
                debug!("Resolved {} -> {}", link, resolved);
                resolved
            }
            Err(e) => {
                warn!("Could not resolve {}: {:#}", link, e);
                link.to_string()
            }
        }
    }

    async fn follow(&self, link: &str) -> Result<String> {
        let response = self.client.get(link).send().await?;
        let final_url = response.url().clone();
        if let Some(target) = share_redirect_target(&final_url) {
            return Ok(target);
        }
        Ok(final_url.to_string())
    }
}

/// `redirectUrl` parameter of a share-wrapper URL, when the host is the
/// known redirector domain.
pub fn share_redirect_target(url: &Url) -> Option<String> {
    if url.host_str()? != SHARE_REDIRECT_HOST {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "redirectUrl")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_host_prefers_redirect_url_param() {
        let url = Url::parse(
            "https://star.aliexpress.com/share/share.htm?platform=AE&redirectUrl=https://www.aliexpress.com/item/123.html",
        )
        .unwrap();
        assert_eq!(
            share_redirect_target(&url).as_deref(),
            Some("https://www.aliexpress.com/item/123.html")
        );
    }

    #[test]
    fn share_host_without_param_is_ignored() {
        let url = Url::parse("https://star.aliexpress.com/share/share.htm?platform=AE").unwrap();
        assert_eq!(share_redirect_target(&url), None);
    }

    #[test]
    fn other_hosts_are_never_unwrapped() {
        let url =
            Url::parse("https://www.aliexpress.com/item/1.html?redirectUrl=https://evil.example")
                .unwrap();
        assert_eq!(share_redirect_target(&url), None);
    }
}
