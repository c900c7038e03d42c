pub mod business;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod locate;

pub use business::extract_business;
pub use discover::{discover_links, DiscoveredLinks, DiscoveryLimits, LinkSet};
pub use error::ScrapeError;
pub use fetch::PageFetcher;
pub use locate::{discover_city_wide, resolve_location_token, CityWideDiscovery, Resolution};
