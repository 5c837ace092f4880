//! Link-time module catalog backing `Module` values

use crate::contract::ModuleDescriptor;

inventory::collect!(ModuleDescriptor);

/// Look up a catalog entry by its fully qualified name
pub fn find_module(name: &str) -> Option<&'static ModuleDescriptor> {
    inventory::iter::<ModuleDescriptor>
        .into_iter()
        .find(|descriptor| descriptor.name == name)
}

/// Look up `<parent>.<child>`
pub fn find_submodule(
    parent: &ModuleDescriptor,
    child: &str,
) -> Option<&'static ModuleDescriptor> {
    find_module(&format!("{}.{}", parent.name, child))
}
