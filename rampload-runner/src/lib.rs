//! Load-test suites for the BuildTask HTTP API.
//!
//! The `rampload-runner` binary wires these together: it parses the command line into a
//! [`SuiteContext`](suites::SuiteContext), runs the selected suites one case after another and
//! prints a [`Report`](report::Report).

pub mod cli;
pub mod report;
pub mod suites;
