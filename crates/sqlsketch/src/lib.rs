//! # sqlsketch
//!
//! Schema modeling engine for a MySQL-flavoured, backtick-quoted dialect.
//!
//! ## Features
//!
//! - **DDL parsing**: multi-statement `CREATE TABLE` scripts → [`Table`] models
//! - **Join inference**: foreign keys form a graph; SELECT joins are resolved from it
//! - **Generators**: CREATE, ALTER (diff), DROP (cascade), SELECT, INSERT, UPDATE, DELETE
//! - **Validation**: names, types, literal values and WHERE clauses checked before generation
//! - **Safe defaults**: UPDATE requires WHERE, DELETE requires WHERE unless explicitly allowed
//!
//! ## Example
//!
//! ```
//! use sqlsketch::{Project, Query, generate, validate_options};
//! use sqlsketch::generate::{SelectOptions, SelectedField};
//! use sqlsketch::TableRef;
//!
//! let mut project = Project::new();
//! project.load_sql(
//!     "CREATE TABLE `shop`.`customers` (`id` INT NOT NULL, PRIMARY KEY (`id`));
//!      CREATE TABLE `shop`.`orders` (
//!        `id` INT NOT NULL,
//!        `customer_id` INT,
//!        PRIMARY KEY (`id`),
//!        CONSTRAINT `fk_orders_customers` FOREIGN KEY (`customer_id`)
//!          REFERENCES `shop`.`customers` (`id`)
//!      );",
//! )?;
//!
//! let query = Query::Select(SelectOptions::new(vec![
//!     SelectedField::new(TableRef::new("shop", "customers"), "id"),
//!     SelectedField::new(TableRef::new("shop", "orders"), "id"),
//! ]));
//! validate_options(&query, &project).into_result()?;
//!
//! assert_eq!(
//!     generate(&project, &query)?,
//!     "SELECT `shop`.`customers`.*, `shop`.`orders`.`id` FROM `shop`.`customers` \
//!      JOIN `shop`.`orders` ON `shop`.`customers`.`id` = `shop`.`orders`.`customer_id`;"
//! );
//! # Ok::<(), sqlsketch::SketchError>(())
//! ```

pub mod error;
pub mod generate;
pub mod graph;
pub mod ident;
pub mod model;
pub mod parser;
pub mod project;
pub mod script;
pub mod validate;

pub use error::{SketchError, SketchResult};
pub use generate::{Query, StatementKind, generate};
pub use graph::{Cardinality, ColumnRef, FromClause, Relation, RelationGraph};
pub use ident::Ident;
pub use model::{
    Constraints, DEFAULT_SCHEMA, Field, Index, IndexKind, Reference, Table, TableRef,
};
pub use parser::{DdlParser, ParseOutcome, SkipReason, SkippedStatement, parse_script};
pub use project::Project;
pub use script::Script;
pub use validate::{Verdict, is_table_altered, validate_options};
