pub mod demand_feed;
