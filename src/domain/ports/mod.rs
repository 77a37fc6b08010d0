mod messaging_port;
mod result_cache_port;
mod upstream_http_port;

pub use messaging_port::MessagingPort;
pub use result_cache_port::ResultCachePort;
pub use upstream_http_port::{UpstreamHttpPort, UpstreamResponse};
