//! Test suites for the tree-construction extension.

mod scenario_tests;
