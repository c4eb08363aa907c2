//! 1Password object model: sub-modules.

pub mod types;
pub mod ids;
pub mod field;
pub mod totp;
pub mod section;
pub mod descriptor;
pub mod item;
pub mod categories;
pub mod registry;
pub mod templates;
pub mod scratch;
pub mod new_item;
pub mod item_list;
pub mod accounts;

// Re-export top-level items for convenience.
pub use types::*;
pub use field::{FieldSectionRef, ItemField, NewField};
pub use totp::NewTotpUri;
pub use section::{NewSection, Section};
pub use descriptor::{ItemDescriptor, ItemUrl, VaultRef};
pub use item::FullItem;
pub use categories::*;
pub use registry::{ItemConstructor, ItemRegistry};
pub use templates::{TemplateMap, TemplateSource};
pub use scratch::ScratchFiles;
pub use new_item::{FieldInput, NewItem, NewLoginItem, SectionInput};
pub use item_list::ItemList;
pub use accounts::{AccountList, AccountRecord, Group, GroupList, User, UserList, Vault, VaultList};
