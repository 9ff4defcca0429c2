pub mod event_proptest;
pub mod graph_proptest;
