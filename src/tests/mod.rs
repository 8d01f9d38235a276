pub mod fake_runner;
