use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, Proxy};
use tracing::debug;

use crate::core::config::InstallConfig;
use crate::core::error::{DevError, DevResult};

const APP_USER_AGENT: &str = concat!("nodedev/", env!("CARGO_PKG_VERSION"));

/// Environment variables consulted for a proxy, highest priority first.
pub const PROXY_ENV_VARS: [&str; 3] = ["http_proxy", "HTTP_PROXY", "npm_config_proxy"];

/// Explicit option first, then the recognised environment variables.
pub fn resolve_proxy<F>(explicit: Option<&str>, lookup_env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(PROXY_ENV_VARS.iter().filter_map(|name| lookup_env(*name)))
        .find(|value| !value.trim().is_empty())
}

pub fn resolve_proxy_from_env(explicit: Option<&str>) -> Option<String> {
    resolve_proxy(explicit, |name| std::env::var(name).ok())
}

pub fn build_http_client(config: &InstallConfig, proxy: Option<&str>) -> DevResult<Client> {
    let mut default_headers = HeaderMap::new();
    // Tarballs are already gzip; the decoder stage expects the raw bytes.
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let mut builder = Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(config.connect_timeout);

    builder = match proxy {
        Some(url) => {
            debug!("using proxy: {}", url);
            let proxy = Proxy::all(url).map_err(|source| DevError::InvalidProxy {
                url: url.to_string(),
                source,
            })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}
