//! Catalog of schemas, tables and columns.
//!
//! The [`Catalog`] exclusively owns every schema, each schema owns its tables
//! and each table owns an arena of columns indexed by column position. Objects
//! are addressed by packed global ids (see [`IdLayout`]), so id lookups are
//! plain vector indexing.
//!
//! Name lookups exist for diagnostics and ground-truth resolution only; the
//! classification engine never consults them. A name lookup that matches
//! nothing fails with [`MetaError::NotFound`], one that matches several
//! objects with [`MetaError::AmbiguousName`].
//!
//! # Example
//!
//! ```rust
//! use meta_guard::catalog::{Catalog, Location};
//!
//! # fn main() -> meta_guard::error::Result<()> {
//! let mut catalog = Catalog::new();
//! let schema = catalog.add_schema("shop", Location::for_file("/data/shop"))?;
//! let customers = catalog.add_table(schema, "customers", Location::new())?;
//! let id = catalog.add_column(customers, "id", Some("INTEGER"))?;
//!
//! assert_eq!(catalog.qualified_name(id).as_deref(), Some("shop.customers.id"));
//! assert_eq!(catalog.resolve_column("customers", "id")?.id(), id);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use crate::error::{MetaError, Result};

mod ids;
mod location;
mod names;

pub use ids::{ColumnId, IdLayout, SchemaId, TableId};
pub use location::Location;
pub use names::{validate_name, MAX_NAME_LENGTH};

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_type: Option<String>,
    #[serde(default)]
    location: Location,
}

impl Column {
    /// The column's global id.
    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// The column's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared data type, if known.
    pub fn data_type(&self) -> Option<&str> {
        self.data_type.as_deref()
    }

    /// Where the column lives; carries its position under [`Location::INDEX`].
    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column[{}, {:08x}]", self.name, self.id)
    }
}

/// A table and its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    id: TableId,
    name: String,
    #[serde(default)]
    location: Location,
    columns: Vec<Column>,
}

impl Table {
    /// The table's global id.
    pub fn id(&self) -> TableId {
        self.id
    }

    /// The table's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the table lives.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Columns in position order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// All columns with the given name.
    pub fn columns_by_name(&self, name: &str) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.name == name).collect()
    }

    /// The single column with the given name.
    pub fn column_by_name(&self, name: &str) -> Result<&Column> {
        single("column", name, self.columns_by_name(name))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Table[{}, {} columns, {:08x}]",
            self.name,
            self.columns.len(),
            self.id
        )
    }
}

/// A schema and its tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    id: SchemaId,
    name: String,
    #[serde(default)]
    location: Location,
    tables: Vec<Table>,
}

impl Schema {
    /// The schema's global id.
    pub fn id(&self) -> SchemaId {
        self.id
    }

    /// The schema's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the schema lives.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Tables in creation order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// The single table with the given name.
    pub fn table_by_name(&self, name: &str) -> Result<&Table> {
        single(
            "table",
            name,
            self.tables.iter().filter(|t| t.name == name).collect(),
        )
    }
}

/// Owner of all schemas, tables and columns, and allocator of their ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    layout: IdLayout,
    schemas: Vec<Schema>,
}

impl Catalog {
    /// Creates an empty catalog with the default id layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty catalog with a custom id layout.
    pub fn with_layout(layout: IdLayout) -> Self {
        Self {
            layout,
            schemas: Vec::new(),
        }
    }

    /// The id layout used by this catalog.
    pub fn layout(&self) -> &IdLayout {
        &self.layout
    }

    /// Adds a schema and returns its id.
    pub fn add_schema(&mut self, name: &str, location: Location) -> Result<SchemaId> {
        validate_name(name)?;
        let number = self.schemas.len() as u32;
        if number >= self.layout.max_schemas() {
            return Err(MetaError::CapacityExceeded {
                kind: "schema",
                limit: self.layout.max_schemas(),
            });
        }
        let id = self.layout.schema_id(number)?;
        debug!(schema = name, id = id.raw(), "Added schema");
        self.schemas.push(Schema {
            id,
            name: name.to_string(),
            location,
            tables: Vec::new(),
        });
        Ok(id)
    }

    /// Adds a table to a schema and returns its id.
    pub fn add_table(&mut self, schema: SchemaId, name: &str, location: Location) -> Result<TableId> {
        validate_name(name)?;
        let layout = self.layout;
        let schema_number = layout.local_schema_id(schema.raw());
        let target = self
            .schema_mut(schema)
            .ok_or_else(|| MetaError::not_found("schema", schema.to_string()))?;

        let number = target.tables.len() as u32;
        if number >= layout.max_tables() {
            return Err(MetaError::CapacityExceeded {
                kind: "table",
                limit: layout.max_tables(),
            });
        }
        let id = layout.table_id(schema_number, number)?;
        debug!(table = name, id = id.raw(), "Added table");
        target.tables.push(Table {
            id,
            name: name.to_string(),
            location,
            columns: Vec::new(),
        });
        Ok(id)
    }

    /// Appends a column to a table and returns its id.
    ///
    /// The column's position is the next free index of the table.
    pub fn add_column(
        &mut self,
        table: TableId,
        name: &str,
        data_type: Option<&str>,
    ) -> Result<ColumnId> {
        validate_name(name)?;
        let layout = self.layout;
        let schema_number = layout.local_schema_id(table.raw());
        let table_number = layout.local_table_id(table.raw());
        let target = self
            .table_mut(table)
            .ok_or_else(|| MetaError::not_found("table", table.to_string()))?;

        let index = target.columns.len();
        if index as u32 >= layout.max_columns() {
            return Err(MetaError::CapacityExceeded {
                kind: "column",
                limit: layout.max_columns(),
            });
        }
        let id = layout.column_id(
            schema_number,
            table_number,
            layout.min_column_number() + index as u32,
        )?;
        target.columns.push(Column {
            id,
            name: name.to_string(),
            data_type: data_type.map(str::to_string),
            location: Location::for_index(index),
        });
        Ok(id)
    }

    /// All schemas in creation order.
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    /// Looks up a schema by id.
    pub fn schema(&self, id: SchemaId) -> Option<&Schema> {
        if !self.layout.is_schema_id(id.raw()) {
            return None;
        }
        let number = self.layout.local_schema_id(id.raw()) as usize;
        self.schemas.get(number)
    }

    fn schema_mut(&mut self, id: SchemaId) -> Option<&mut Schema> {
        if !self.layout.is_schema_id(id.raw()) {
            return None;
        }
        let number = self.layout.local_schema_id(id.raw()) as usize;
        self.schemas.get_mut(number)
    }

    /// Looks up a table by id.
    pub fn table(&self, id: TableId) -> Option<&Table> {
        if !self.layout.is_table_id(id.raw()) {
            return None;
        }
        let schema = self.schema(self.layout.schema_of(id))?;
        schema
            .tables
            .get(self.layout.local_table_id(id.raw()) as usize)
    }

    fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        if !self.layout.is_table_id(id.raw()) {
            return None;
        }
        let number = self.layout.local_table_id(id.raw()) as usize;
        let schema_id = self.layout.schema_of(id);
        self.schema_mut(schema_id)?.tables.get_mut(number)
    }

    /// Looks up a column by id.
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        if !self.layout.is_column_id(id.raw()) {
            return None;
        }
        let table = self.table(self.layout.table_of(id))?;
        table
            .columns
            .get(self.layout.local_column_id(id.raw()) as usize)
    }

    /// The table owning a column.
    pub fn table_of(&self, id: ColumnId) -> Option<&Table> {
        self.column(id)?;
        self.table(self.layout.table_of(id))
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.schemas
            .iter()
            .flat_map(|s| s.tables.iter())
            .map(|t| t.columns.len())
            .sum()
    }

    /// The single schema with the given name.
    pub fn schema_by_name(&self, name: &str) -> Result<&Schema> {
        single(
            "schema",
            name,
            self.schemas.iter().filter(|s| s.name == name).collect(),
        )
    }

    /// All tables with the given name, across schemas.
    pub fn find_tables(&self, name: &str) -> Vec<&Table> {
        self.schemas
            .iter()
            .flat_map(|s| s.tables.iter())
            .filter(|t| t.name == name)
            .collect()
    }

    /// The single table with the given name, across schemas.
    pub fn resolve_table(&self, name: &str) -> Result<&Table> {
        single("table", name, self.find_tables(name))
    }

    /// All columns named `column` in tables named `table`, across schemas.
    pub fn find_columns(&self, table: &str, column: &str) -> Vec<&Column> {
        self.find_tables(table)
            .into_iter()
            .flat_map(|t| t.columns_by_name(column))
            .collect()
    }

    /// The single column `table.column`, across schemas.
    pub fn resolve_column(&self, table: &str, column: &str) -> Result<&Column> {
        single(
            "column",
            &format!("{table}.{column}"),
            self.find_columns(table, column),
        )
    }

    /// Renders `schema.table.column` for diagnostics.
    pub fn qualified_name(&self, id: ColumnId) -> Option<String> {
        let column = self.column(id)?;
        let table = self.table(self.layout.table_of(id))?;
        let schema = self.schema(self.layout.schema_of(table.id))?;
        Some(format!("{}.{}.{}", schema.name, table.name, column.name))
    }

    /// Creates a schema from the `CREATE TABLE` statements in `sql`.
    ///
    /// Tables are added in name order; columns keep their declared order and
    /// data types. Statements other than `CREATE TABLE` are ignored.
    #[instrument(skip(self, sql), fields(sql_len = sql.len()))]
    pub fn import_ddl(&mut self, schema_name: &str, sql: &str) -> Result<SchemaId> {
        let tables = crate::sql::parse_schema(sql)?;
        let schema = self.add_schema(schema_name, Location::new())?;
        for (table_name, columns) in &tables {
            let table = self.add_table(schema, table_name, Location::new())?;
            for column in columns {
                self.add_column(table, &column.name, column.data_type.as_deref())?;
            }
        }
        debug!(tables = tables.len(), "Imported DDL into catalog");
        Ok(schema)
    }
}

fn single<'a, T>(kind: &'static str, name: &str, matches: Vec<&'a T>) -> Result<&'a T> {
    match matches.len() {
        0 => Err(MetaError::not_found(kind, name)),
        1 => Ok(matches[0]),
        n => Err(MetaError::ambiguous(kind, name, n)),
    }
}
