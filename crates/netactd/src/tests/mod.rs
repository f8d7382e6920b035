//! Test suites for the actuation endpoint.

mod dispatch_behaviour;
