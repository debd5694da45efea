// Module exports for pure logic
pub mod sections;   // Section ids, registry and the layout surface
pub mod order;      // Dense 1..=V ordering of visible sections
pub mod visibility; // Show/hide toggles and their persistence
pub mod icons;      // Icon candidate chain
pub mod search;
pub mod apps;
pub mod weather;
pub mod feeds;      // Bookmark and history tiles
