//! Scenario tests that run several modules together.
