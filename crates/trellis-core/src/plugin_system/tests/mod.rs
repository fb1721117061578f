#[cfg(test)]
mod descriptor_tests;
