pub mod match_feed;
pub mod sync_gate;
