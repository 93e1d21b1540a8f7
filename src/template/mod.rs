//! Template extraction and re-insertion
//!
//! A template is an element carrying the reserved template attribute. At
//! construction the registry detaches every such element from the live
//! tree and records where clones must later be inserted. Bind calls then
//! clone the prototype per data item.
//!
//! ```html
//! <ul>
//!     <li data-weft-template>{{name}}</li>
//! </ul>
//! ```

mod instance;
mod registry;

pub use instance::TemplateInstance;
pub use registry::TemplateRegistry;
