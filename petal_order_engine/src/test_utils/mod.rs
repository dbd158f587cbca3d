//! Support for integration tests: throwaway database environments and store fixtures.

pub mod prepare_env;
pub mod seed;
