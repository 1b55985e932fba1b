//! Schema-to-schema transform synthesis.
//!
//! `reshape-transform` takes a source and a target schema and emits the Go
//! statements that build a target value from a source value, together with
//! the helper functions those statements call.
//!
//! # Architecture
//!
//! ```text
//! Input                 Core                              Output
//! ─────────────    ──────────────────────────────    ──────────────
//! JSON document ─> TypeSet ─┐                     ┌─> code fragment
//! (input.rs)       (schema) │   compat::check     │
//!                           ├─> engine ───────────┼─> HelperDescriptors
//! AttributeContext ─────────┘   attr, scope,      │
//! (per side)                    literal           └─> Go file (output.rs)
//! ```
//!
//! Every synthesis call owns its memo and [`NameScope`]; a [`Transformer`]
//! holds only shared references and can be used from many threads.
//!
//! # Example
//!
//! ```
//! use reshape_transform::{Field, Primitive, Schema, TransformRequest, Transformer, TypeSet};
//!
//! let mut types = TypeSet::new();
//! let point = types.insert(
//!     "Point",
//!     Schema::Object(vec![
//!         Field::required("x", Primitive::Int),
//!         Field::optional("label", Primitive::String),
//!     ]),
//! );
//!
//! let request = TransformRequest::new(Schema::Named(point), Schema::Named(point));
//! let result = Transformer::new(&types).transform(&request).unwrap();
//! assert_eq!(
//!     result.code,
//!     "target := &Point{\n\tX: source.X,\n\tLabel: source.Label,\n}"
//! );
//! assert!(result.helpers.is_empty());
//! ```

mod attr;
pub mod compat;
pub mod context;
pub mod engine;
pub mod error;
pub mod input;
pub mod literal;
pub mod output;
pub mod schema;
pub mod scope;

pub use context::{AttributeContext, PointerPolicy};
pub use engine::{
    HelperDescriptor, TransformRequest, TransformResult, Transformer, append_helpers, transform,
};
pub use error::TransformError;
pub use input::{Document, InputError};
pub use output::{GoFunction, render_file, render_function, render_helper};
pub use schema::{Field, NamedId, Primitive, Schema, SchemaKind, TypeSet, Variant};
pub use scope::{NameScope, goify};
