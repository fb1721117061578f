mod report_tests;
mod state_tests;
