//! Campus book-exchange service.
//!
//! Users list books and propose trades; owners accept or reject them. The
//! domain lives in [`modules`], each one a [`bookswap_kernel::Module`] mounted
//! under `/api/{name}` by the HTTP facade.

pub mod modules;
pub mod refresh;
pub mod state;
pub mod store;

use bookswap_kernel::{settings::Settings, ModuleRegistry};

use state::AppState;

/// Build shared state and a registry holding every module.
pub fn build_app(settings: &Settings) -> anyhow::Result<(ModuleRegistry, AppState)> {
    let state = AppState::from_settings(settings)?;
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &state)?;
    Ok((registry, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_module_is_registered() {
        let (registry, _) = build_app(&Settings::default()).unwrap();
        let names: Vec<&str> = registry.modules().map(|m| m.name()).collect();
        assert_eq!(names, vec!["users", "books", "exchanges", "admin"]);
    }
}
