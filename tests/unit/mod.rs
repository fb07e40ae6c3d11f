/// Unit tests against the public library API
mod recurrence_properties;
mod streak_tests;
mod milestone_tests;
