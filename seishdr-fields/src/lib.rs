//! Header field registry and resolution engine
//!
//! `seishdr-fields` maps field names such as `stla`, `t3`, `b utc` or `kt*`
//! onto the values stored in a fixed-layout record header, across every
//! registered header version.
//!
//! # Architecture
//!
//! - **Schemas**: one immutable [`HeaderSchema`] per header version, held in a [`SchemaRegistry`]
//! - **Classification**: a name is classified once into a [`FieldClass`], then matched exhaustively
//! - **Virtual fields**: computed fields implement [`VirtualField`] and never write to the header
//! - **Time**: reference time plus offset becomes UTC or TAI through a [`LeapSecondTable`]
//! - **Outcomes as values**: undefined, invalid and unknown fields are [`Resolution`] variants
//!
//! ```
//! use seishdr_fields::{FieldResolver, RawHeader};
//! use seishdr_config::ResolverConfig;
//!
//! let resolver = FieldResolver::from_config(&ResolverConfig::default())?;
//! let schema = resolver.registry().get(6).expect("version 6 is built in");
//! let mut header = RawHeader::undefined(schema);
//! header.set_number(schema, "stla", 34.95)?;
//!
//! let fields = resolver.resolve(6, &header, "st");
//! assert_eq!(fields.len(), 4);
//! assert_eq!(fields[2].display, "34.95");
//! # Ok::<(), seishdr_fields::FieldsError>(())
//! ```

pub mod error;
pub mod expand;
pub mod format;
pub mod header;
pub mod name;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod time;
pub mod types;
pub mod versions;
pub mod virtual_fields;

pub use error::{FieldsError, Result};
pub use expand::{expand, expand_across};
pub use header::RawHeader;
pub use name::{FieldName, Qualifier};
pub use registry::{FieldDef, SchemaDef, SchemaRegistry};
pub use resolver::{resolve_field, FieldResolver, ResolveOptions};
pub use schema::{
    EnumTable, FieldClass, FieldSlot, HeaderSchema, HeaderSchemaBuilder, LogicalCodes,
    DEFAULT_UNDEFINED, DEFAULT_UNDEFINED_TEXT,
};
pub use time::{
    tai_offset, to_calendar, to_day_of_year, utc_offset, AbsoluteTime, LeapSecond,
    LeapSecondTable, ReferenceTime, TimeError,
};
pub use types::{
    FieldKind, FieldState, InvalidReason, Resolution, ResolvedField, TimeForm, TimeScale,
    TimeStamp, Value,
};
pub use virtual_fields::{evaluate_reference, VirtualField, VirtualRegistry};
