pub mod assets;
pub mod form;
pub mod pipeline;
pub mod reconcile;
pub mod resolve;
pub mod store;
pub mod validate;

#[cfg(test)]
pub mod testutil;
