pub mod admin;
pub mod books;
pub mod exchanges;
pub mod users;

use bookswap_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register every bookswap module; mount order is registration order.
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) -> anyhow::Result<()> {
    registry.register(users::create_module(state.clone()))?;
    registry.register(books::create_module(state.clone()))?;
    registry.register(exchanges::create_module(state.clone()))?;
    registry.register(admin::create_module(state.clone()))?;
    Ok(())
}
