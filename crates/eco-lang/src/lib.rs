//! The language registry (external interface from section 6): a global
//! `lang_name -> LanguageDescriptor` mapping, built once at startup and
//! threaded through the session as an explicit, immutable value rather
//! than a global. `eco-lbox`'s detector and `ecoc`'s CLI both consume a
//! `&LanguageRegistry` rather than reaching for a singleton.

mod descriptor;
mod registry;

pub use descriptor::LanguageDescriptor;
pub use registry::LanguageRegistry;
