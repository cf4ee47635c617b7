use sqlsketch::generate::{CreateOptions, generate_create};
use sqlsketch::{DdlParser, IndexKind, SkipReason, Table, parse_script};

const SCHEMA: &str = r#"
-- MySQL Workbench Forward Engineering
SET @OLD_UNIQUE_CHECKS=@@UNIQUE_CHECKS, UNIQUE_CHECKS=0;

DROP DATABASE IF EXISTS `library`;
CREATE DATABASE IF NOT EXISTS `library` DEFAULT CHARACTER SET utf8;

CREATE TABLE IF NOT EXISTS `library`.`authors` (
  `id` INT NOT NULL AUTO_INCREMENT,
  `name` VARCHAR(100) NOT NULL,
  `email` VARCHAR(255) NULL DEFAULT NULL,
  `rating` DECIMAL(3,1) DEFAULT 0,
  PRIMARY KEY (`id`),
  UNIQUE INDEX `email_UNIQUE` (`email` ASC) VISIBLE);

CREATE TABLE IF NOT EXISTS `library`.`legacy` (
  `id` INT NOT NULL,
  PRIMARY KEY (`id`))
ENGINE = InnoDB;

CREATE TABLE IF NOT EXISTS `library`.`books` (
  `id` INT NOT NULL AUTO_INCREMENT,
  `author_id` INT NOT NULL,
  `title` VARCHAR(200) NOT NULL,
  `isbn` CHAR(13) NOT NULL,
  PRIMARY KEY (`id`),
  UNIQUE INDEX `isbn_UNIQUE` (`isbn` ASC) VISIBLE,
  INDEX `fk_books_authors_idx` (`author_id` ASC) VISIBLE,
  CONSTRAINT `fk_books_authors`
    FOREIGN KEY (`author_id`)
    REFERENCES `library`.`authors` (`id`)
    ON DELETE NO ACTION
    ON UPDATE NO ACTION);
"#;

/// Column, PK, unique and index content of a table, order-insensitive.
fn shape(table: &Table) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut columns: Vec<String> = table
        .fields
        .iter()
        .map(|f| {
            format!(
                "{} {} pk={} nn={} ai={} uq={} def={:?} ref={:?}",
                f.name,
                f.ty,
                f.is_pk,
                f.is_not_null(),
                f.is_auto_increment(),
                f.is_unique(),
                f.default_value(),
                f.foreign_reference()
            )
        })
        .collect();
    columns.sort();
    let pk = table.primary_key().into_iter().map(str::to_string).collect();
    let mut index: Vec<String> = table
        .index
        .iter()
        .map(|i| format!("{} {} {:?}", i.kind.as_str(), i.name, i.fields))
        .collect();
    index.sort();
    (columns, pk, index)
}

#[test]
fn workbench_script_is_parsed() {
    let outcome = DdlParser::new().parse(SCHEMA);
    let titles: Vec<_> = outcome.tables.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["authors", "books"]);

    let reasons: Vec<_> = outcome.skipped.iter().map(|s| s.reason).collect();
    assert_eq!(
        reasons,
        vec![
            SkipReason::NotCreateTable,
            SkipReason::DatabaseStatement,
            SkipReason::DatabaseStatement,
            SkipReason::Unterminated,
        ]
    );
}

#[test]
fn parse_then_create_round_trips() {
    for table in parse_script(SCHEMA) {
        let sql = generate_create(&CreateOptions::from_table(&table)).unwrap();
        let reparsed = parse_script(&sql);
        assert_eq!(reparsed.len(), 1, "regenerated script did not parse:\n{sql}");
        assert_eq!(shape(&reparsed[0]), shape(&table), "mismatch for:\n{sql}");
    }
}

#[test]
fn parsed_foreign_key_is_complete() {
    let tables = parse_script(SCHEMA);
    let books = tables.iter().find(|t| t.title == "books").unwrap();
    let fk = books.fk_index_for("author_id").unwrap();
    assert_eq!(fk.name, "fk_books_authors");
    assert_eq!(
        books.field("author_id").unwrap().references.as_ref().unwrap().table,
        "authors"
    );
    assert!(books.index.iter().any(|i| i.kind == IndexKind::Index));
    assert!(books.field("isbn").unwrap().is_unique());
}

#[test]
fn nested_parentheses_around_semicolons() {
    let tables = parse_script(
        "CREATE TABLE s.t (id INT, kind ENUM('a;b', 'c') DEFAULT 'c', \
         CHECK ((id > 0) AND (kind <> ';')), PRIMARY KEY (id)); \
         CREATE TABLE s.u (id INT)",
    );
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].field("kind").unwrap().ty, "ENUM('a;b','c')");
    assert!(tables[0].field("id").unwrap().is_pk);
}
