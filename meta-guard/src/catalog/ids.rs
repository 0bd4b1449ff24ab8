//! Global identifiers for catalog objects.
//!
//! Every schema, table and column is addressed by a single `u32` that packs
//! three bit fields: the local schema number in the high bits, the local
//! table number in the middle and the local column number in the low bits.
//!
//! ```text
//!  31            24 23                  12 11                   0
//! +----------------+----------------------+----------------------+
//! |  schema (8)    |     table (12)       |     column (12)      |
//! +----------------+----------------------+----------------------+
//! ```
//!
//! An all-ones column field addresses the table itself; all-ones table and
//! column fields address the schema itself. Column ids of one table are
//! therefore ascending in column position, which the inclusion dependency
//! code relies on for its sorted co-iteration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MetaError, Result};

macro_rules! global_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw global id.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw global id.
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::LowerHex for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::LowerHex::fmt(&self.0, f)
            }
        }
    };
}

global_id!(
    /// Identifier of a column. Totally ordered; uniqueness is owned by the
    /// [`Catalog`](super::Catalog) that allocated it.
    ColumnId
);

global_id!(
    /// Identifier of a table.
    TableId
);

global_id!(
    /// Identifier of a schema.
    SchemaId
);

/// Bit layout of global ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdLayout {
    table_bits: u8,
    column_bits: u8,
}

impl Default for IdLayout {
    fn default() -> Self {
        Self {
            table_bits: Self::DEFAULT_TABLE_BITS,
            column_bits: Self::DEFAULT_COLUMN_BITS,
        }
    }
}

impl IdLayout {
    /// Default number of bits for the local table number.
    pub const DEFAULT_TABLE_BITS: u8 = 12;
    /// Default number of bits for the local column number.
    pub const DEFAULT_COLUMN_BITS: u8 = 12;

    /// Creates a layout with the given table and column field widths.
    ///
    /// At least two bits must remain for schemas.
    pub fn new(table_bits: u8, column_bits: u8) -> Result<Self> {
        if table_bits == 0 || column_bits == 0 {
            return Err(MetaError::invalid_argument(
                "table and column fields need at least one bit each",
            ));
        }
        if u32::from(table_bits) + u32::from(column_bits) > 30 {
            return Err(MetaError::invalid_argument(format!(
                "{table_bits} table bits and {column_bits} column bits leave fewer than 2 schema bits"
            )));
        }
        Ok(Self {
            table_bits,
            column_bits,
        })
    }

    /// Number of bits used for the local schema number.
    pub fn schema_bits(&self) -> u8 {
        32 - self.table_bits - self.column_bits
    }

    fn column_mask(&self) -> u32 {
        (1u32 << self.column_bits) - 1
    }

    fn table_mask(&self) -> u32 {
        (1u32 << self.table_bits) - 1
    }

    /// Number of schemas addressable with this layout.
    pub fn max_schemas(&self) -> u32 {
        1u32 << self.schema_bits()
    }

    /// Number of tables per schema; the all-ones value is reserved.
    pub fn max_tables(&self) -> u32 {
        self.table_mask()
    }

    /// Number of columns per table; the all-ones value is reserved.
    pub fn max_columns(&self) -> u32 {
        self.column_mask()
    }

    /// The local number of the first column of a table.
    pub fn min_column_number(&self) -> u32 {
        0
    }

    /// Packs local numbers into a global id.
    pub fn create_global_id(&self, schema: u32, table: u32, column: u32) -> Result<u32> {
        if schema >= self.max_schemas() {
            return Err(MetaError::invalid_argument(format!(
                "schema number {schema} exceeds {} schema bits",
                self.schema_bits()
            )));
        }
        if table > self.table_mask() {
            return Err(MetaError::invalid_argument(format!(
                "table number {table} exceeds {} table bits",
                self.table_bits
            )));
        }
        if column > self.column_mask() {
            return Err(MetaError::invalid_argument(format!(
                "column number {column} exceeds {} column bits",
                self.column_bits
            )));
        }
        let shift = u32::from(self.table_bits) + u32::from(self.column_bits);
        Ok((schema << shift) | (table << self.column_bits) | column)
    }

    /// Global id addressing the schema itself.
    pub fn schema_id(&self, schema: u32) -> Result<SchemaId> {
        self.create_global_id(schema, self.table_mask(), self.column_mask())
            .map(SchemaId::new)
    }

    /// Global id addressing the table itself.
    pub fn table_id(&self, schema: u32, table: u32) -> Result<TableId> {
        if table == self.table_mask() {
            return Err(MetaError::invalid_argument(format!(
                "table number {table} is reserved"
            )));
        }
        self.create_global_id(schema, table, self.column_mask())
            .map(TableId::new)
    }

    /// Global id of a column.
    pub fn column_id(&self, schema: u32, table: u32, column: u32) -> Result<ColumnId> {
        if table == self.table_mask() || column == self.column_mask() {
            return Err(MetaError::invalid_argument(format!(
                "table {table} / column {column} use a reserved number"
            )));
        }
        self.create_global_id(schema, table, column)
            .map(ColumnId::new)
    }

    /// Extracts the local schema number.
    pub fn local_schema_id(&self, id: u32) -> u32 {
        id >> (u32::from(self.table_bits) + u32::from(self.column_bits))
    }

    /// Extracts the local table number.
    pub fn local_table_id(&self, id: u32) -> u32 {
        (id >> self.column_bits) & self.table_mask()
    }

    /// Extracts the local column number.
    pub fn local_column_id(&self, id: u32) -> u32 {
        id & self.column_mask()
    }

    /// Whether the id addresses a schema.
    pub fn is_schema_id(&self, id: u32) -> bool {
        self.local_table_id(id) == self.table_mask() && self.local_column_id(id) == self.column_mask()
    }

    /// Whether the id addresses a table.
    pub fn is_table_id(&self, id: u32) -> bool {
        self.local_table_id(id) != self.table_mask() && self.local_column_id(id) == self.column_mask()
    }

    /// Whether the id addresses a column.
    pub fn is_column_id(&self, id: u32) -> bool {
        self.local_table_id(id) != self.table_mask() && self.local_column_id(id) != self.column_mask()
    }

    /// Id of the table a column belongs to.
    pub fn table_of(&self, column: ColumnId) -> TableId {
        TableId::new(column.raw() | self.column_mask())
    }

    /// Id of the schema a table belongs to.
    pub fn schema_of(&self, table: TableId) -> SchemaId {
        SchemaId::new(table.raw() | (self.table_mask() << self.column_bits) | self.column_mask())
    }
}
