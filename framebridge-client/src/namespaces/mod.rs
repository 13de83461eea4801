// Capability namespaces
// Thin typed call-sites over Bridge::call; each one gates, checks support, then sends

pub mod marketplace;
pub mod monetization;

pub use marketplace::Marketplace;
pub use monetization::Monetization;
