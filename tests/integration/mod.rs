//! End-to-end tests of guild sessions driven through fakes

mod idle;
mod registry;
