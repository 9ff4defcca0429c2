//! Integration tests
//!
//! `api` drives the REST surface through the router, `realtime` drives
//! messaging sessions, `database` runs the stores against Postgres.
