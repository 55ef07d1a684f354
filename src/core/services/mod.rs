pub mod diff_service;
pub mod identity_resolver;
pub mod reconciler;
pub mod status_mapper;
pub mod sync_coordinator;

#[cfg(test)]
pub(crate) mod test_support;
