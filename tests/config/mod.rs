/*!
Configuration tests.

Command-line parsing, TOML file loading and the merge/validation that
produces a run configuration.
*/

pub mod cli_tests;
