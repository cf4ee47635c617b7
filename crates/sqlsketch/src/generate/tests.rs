use super::*;
use crate::model::{Index, IndexKind};

fn shop() -> Project {
    let mut project = Project::new();
    project
        .add_table(
            Table::new("shop", "customers")
                .with_field(Field::new("id", "INT").primary_key().not_null().auto_increment())
                .with_field(Field::new("name", "VARCHAR(45)"))
                .with_field(Field::new("email", "VARCHAR(255)").unique()),
        )
        .unwrap();
    project
        .add_table(
            Table::new("shop", "orders")
                .with_field(Field::new("id", "INT").primary_key())
                .with_field(Field::new("customer_id", "INT").references("shop", "customers", "id"))
                .with_field(Field::new("total", "DECIMAL(10,2)"))
                .with_index(Index::foreign_key("fk_orders_customers", "customer_id")),
        )
        .unwrap();
    project
        .add_table(
            Table::new("shop", "items")
                .with_field(Field::new("id", "INT").primary_key())
                .with_field(Field::new("order_id", "INT").references("shop", "orders", "id"))
                .with_index(Index::foreign_key("fk_items_orders", "order_id")),
        )
        .unwrap();
    project
}

fn customers() -> TableRef {
    TableRef::new("shop", "customers")
}

fn orders() -> TableRef {
    TableRef::new("shop", "orders")
}

// ==================== SELECT ====================

#[test]
fn test_select_whole_table_uses_star() {
    let project = shop();
    let opts = SelectOptions::new(vec![
        SelectedField::new(customers(), "id"),
        SelectedField::new(customers(), "name"),
        SelectedField::new(customers(), "email"),
    ]);
    assert_eq!(
        generate_select(project.tables(), &opts).unwrap(),
        "SELECT `shop`.`customers`.* FROM `shop`.`customers`;"
    );
}

#[test]
fn test_select_columns_with_aggregate_and_clauses() {
    let project = shop();
    let opts = SelectOptions::new(vec![
        SelectedField::new(customers(), "name"),
        SelectedField::new(orders(), "total").with_aggregate(Aggregate::Sum),
    ])
    .distinct()
    .where_clause("total > 10")
    .group_by("name")
    .order_by("name DESC")
    .limit(5);

    assert_eq!(
        generate_select(project.tables(), &opts).unwrap(),
        "SELECT DISTINCT `shop`.`customers`.`name`, SUM(`shop`.`orders`.`total`) \
         FROM `shop`.`customers` JOIN `shop`.`orders` ON `shop`.`customers`.`id` = `shop`.`orders`.`customer_id` \
         WHERE total > 10 GROUP BY name ORDER BY name DESC LIMIT 5;"
    );
}

#[test]
fn test_select_aggregate_disables_star() {
    let project = shop();
    let opts = SelectOptions::new(vec![
        SelectedField::new(customers(), "id").with_aggregate(Aggregate::Count),
        SelectedField::new(customers(), "name"),
        SelectedField::new(customers(), "email"),
    ]);
    let sql = generate_select(project.tables(), &opts).unwrap();
    assert!(sql.starts_with("SELECT COUNT(`shop`.`customers`.`id`), `shop`.`customers`.`name`"));
    assert!(!sql.contains(".*"));
}

#[test]
fn test_select_three_tables_single_join_each() {
    let project = shop();
    let opts = SelectOptions::new(vec![
        SelectedField::new(TableRef::new("shop", "items"), "id"),
        SelectedField::new(orders(), "id"),
        SelectedField::new(customers(), "name"),
    ]);
    let sql = generate_select(project.tables(), &opts).unwrap();
    assert!(sql.contains("FROM `shop`.`orders` JOIN `shop`.`items`"));
    assert_eq!(sql.matches("JOIN `shop`.`customers`").count(), 1);
    assert_eq!(sql.matches(" JOIN ").count(), 2);
}

#[test]
fn test_select_unknown_table_fails() {
    let project = shop();
    let opts = SelectOptions::new(vec![SelectedField::new(TableRef::new("shop", "ghost"), "id")]);
    assert!(generate_select(project.tables(), &opts).unwrap_err().is_not_found());
}

#[test]
fn test_select_nothing_selected_fails() {
    let project = shop();
    let err = generate_select(project.tables(), &SelectOptions::default()).unwrap_err();
    assert!(err.is_missing_input());
}

// ==================== INSERT / UPDATE / DELETE ====================

#[test]
fn test_insert_only_valued_columns() {
    let project = shop();
    let mut opts = InsertOptions::new(customers()).value("name", "O'Brien");
    opts.values.push(FieldValue::empty("email"));
    opts.values.push(FieldValue::new("id", ""));

    assert_eq!(
        generate(&project, &Query::Insert(opts)).unwrap(),
        "INSERT INTO `shop`.`customers` (`name`) VALUES ('O\\'Brien');"
    );
}

#[test]
fn test_insert_escapes_backslashes() {
    let project = shop();
    let opts = InsertOptions::new(customers()).value("name", "a\\");
    assert_eq!(
        generate(&project, &Query::Insert(opts)).unwrap(),
        "INSERT INTO `shop`.`customers` (`name`) VALUES ('a\\\\');"
    );
}

#[test]
fn test_insert_without_values_fails() {
    let project = shop();
    let mut opts = InsertOptions::new(customers());
    opts.values.push(FieldValue::empty("name"));
    let err = generate(&project, &Query::Insert(opts)).unwrap_err();
    assert!(err.is_missing_input());
}

#[test]
fn test_update_requires_where() {
    let project = shop();
    let opts = UpdateOptions::new(customers()).set("name", "Ann");
    assert!(generate(&project, &Query::Update(opts.clone())).is_err());

    let sql = generate(&project, &Query::Update(opts.where_clause("id = 1"))).unwrap();
    assert_eq!(sql, "UPDATE `shop`.`customers` SET `name` = 'Ann' WHERE id = 1;");
}

#[test]
fn test_delete_all_needs_opt_in() {
    let project = shop();
    let opts = DeleteOptions::new(orders());
    assert!(generate(&project, &Query::Delete(opts.clone())).is_err());

    let sql = generate(&project, &Query::Delete(opts.allow_delete_all(true))).unwrap();
    assert_eq!(sql, "DELETE FROM `shop`.`orders`;");
}

#[test]
fn test_unknown_target_is_not_selected() {
    let project = shop();
    let err = generate(&project, &Query::Drop(DropOptions::new(TableRef::new("x", "y")))).unwrap_err();
    assert!(err.to_string().contains("table is not selected"));
}

// ==================== CREATE ====================

#[test]
fn test_create_table_shape() {
    let opts = CreateOptions::new("shop", "tags")
        .field(FieldDraft::new("id", "INT").primary_key().not_null().auto_increment())
        .field(FieldDraft::new("label", "VARCHAR(20)").not_null().unique().with_default("'x'"));

    assert_eq!(
        generate_create(&opts).unwrap(),
        "CREATE TABLE `shop`.`tags` (\n\
         `id` INT NOT NULL AUTO_INCREMENT,\n\
         `label` VARCHAR(20) NOT NULL DEFAULT 'x',\n\
         PRIMARY KEY (`id`),\n\
         UNIQUE INDEX `label_UNIQUE` (`label` ASC) VISIBLE\n\
         );"
    );
}

#[test]
fn test_create_without_pk_omits_clause() {
    let opts = CreateOptions::new("s", "log").field(FieldDraft::new("line", "TEXT"));
    assert_eq!(generate_create(&opts).unwrap(), "CREATE TABLE `s`.`log` (\n`line` TEXT\n);");
}

#[test]
fn test_create_emits_indexes_and_foreign_keys() {
    let project = shop();
    let orders = project.table(&orders()).unwrap().clone();
    let opts = CreateOptions::from_table(&orders)
        .with_index(Index::new("total_idx", IndexKind::Index, vec!["total".into()]));
    let sql = generate_create(&opts).unwrap();
    assert!(sql.contains(
        "CONSTRAINT `fk_orders_customers` FOREIGN KEY (`customer_id`) REFERENCES `shop`.`customers` (`id`)"
    ));
    assert!(sql.contains("INDEX `total_idx` (`total` ASC) VISIBLE"));
}

#[test]
fn test_create_missing_inputs() {
    assert!(generate_create(&CreateOptions::default()).unwrap_err().is_missing_input());
    assert!(generate_create(&CreateOptions::new("s", "t")).is_err());

    let mut unnamed = CreateOptions::new("s", "t");
    unnamed.fields.push(FieldDraft::default());
    assert_eq!(
        generate_create(&unnamed).unwrap_err().to_string(),
        "Missing input: field 1 has no name"
    );
}

// ==================== ALTER ====================

fn live_x() -> Table {
    Table::new("s", "t").with_field(Field::new("x", "INT").primary_key())
}

#[test]
fn test_alter_add_only() {
    let live = live_x();
    let opts = AlterOptions::from_table(&live).add_field(FieldDraft::new("y", "int"));
    let sql = generate_alter(&live, &opts).unwrap();
    assert_eq!(sql, "ALTER TABLE `s`.`t` ADD COLUMN `y` int;");
    assert_eq!(sql.matches("ADD COLUMN").count(), 1);
    assert!(!sql.contains("DROP") && !sql.contains("MODIFY"));
}

#[test]
fn test_alter_no_change_is_empty() {
    let live = live_x();
    assert_eq!(generate_alter(&live, &AlterOptions::from_table(&live)).unwrap(), "");
}

#[test]
fn test_alter_rename_comes_first() {
    let live = live_x();
    let opts = AlterOptions::from_table(&live)
        .rename("s", "renamed")
        .add_field(FieldDraft::new("note", "TEXT"));
    assert_eq!(
        generate_alter(&live, &opts).unwrap(),
        "ALTER TABLE `s`.`t` RENAME TO `s`.`renamed`,\n\tADD COLUMN `note` TEXT;"
    );
}

#[test]
fn test_alter_primary_key_compared_as_set() {
    let live = Table::new("s", "t")
        .with_field(Field::new("a", "INT").primary_key())
        .with_field(Field::new("b", "INT").primary_key());
    let mut opts = AlterOptions::from_table(&live);
    opts.fields.reverse();
    assert_eq!(generate_alter(&live, &opts).unwrap(), "");

    let opts = AlterOptions::from_table(&live).remove_field("b");
    assert_eq!(
        generate_alter(&live, &opts).unwrap(),
        "ALTER TABLE `s`.`t` DROP COLUMN `b`,\n\tDROP PRIMARY KEY, ADD PRIMARY KEY (`a`);"
    );
}

#[test]
fn test_alter_unique_synthesized_once() {
    let live = live_x().with_field(Field::new("code", "CHAR(3)"));
    let opts = AlterOptions::from_table(&live)
        .modify_field(FieldDraft::new("code", "CHAR(3)").unique())
        .with_index(Index::unique_for("code"));
    let sql = generate_alter(&live, &opts).unwrap();
    assert_eq!(sql.matches("ADD UNIQUE `code_UNIQUE` (`code`)").count(), 1);
    assert!(sql.contains("MODIFY COLUMN `code` CHAR(3)"));
    // inputs untouched
    assert_eq!(opts.index.len(), 1);
}

#[test]
fn test_alter_index_diff() {
    let live = live_x()
        .with_field(Field::new("c_id", "INT").references("s", "c", "id"))
        .with_index(Index::foreign_key("fk_old", "c_id"))
        .with_index(Index::new("ix_x", IndexKind::Index, vec!["x".into()]));
    let opts = AlterOptions::from_table(&live)
        .drop_index("fk_old")
        .drop_index("ix_x")
        .with_index(Index::foreign_key("fk_new", "c_id"));
    let sql = generate_alter(&live, &opts).unwrap();
    assert_eq!(
        sql,
        "ALTER TABLE `s`.`t` DROP FOREIGN KEY `fk_old`,\n\t\
         DROP INDEX `ix_x`,\n\t\
         ADD CONSTRAINT `fk_new` FOREIGN KEY (`c_id`) REFERENCES `s`.`c`(`id`);"
    );
}

// ==================== DROP ====================

#[test]
fn test_drop_cascades_constraints_first() {
    let project = shop();
    let sql = generate(&project, &Query::Drop(DropOptions::new(customers()))).unwrap();
    assert_eq!(
        sql,
        "ALTER TABLE `shop`.`orders` DROP CONSTRAINT `fk_orders_customers`;\n\
         DROP TABLE `shop`.`customers`;"
    );
}

#[test]
fn test_drop_without_dependents() {
    let project = shop();
    let items = project.table(&TableRef::new("shop", "items")).unwrap();
    assert_eq!(generate_drop(items, project.tables()), "DROP TABLE `shop`.`items`;");
}

// ==================== Query ====================

#[test]
fn test_generators_are_deterministic() {
    let project = shop();
    let query = Query::Select(SelectOptions::new(vec![
        SelectedField::new(orders(), "total"),
        SelectedField::new(customers(), "name"),
    ]));
    assert_eq!(
        generate(&project, &query).unwrap(),
        generate(&project, &query).unwrap()
    );
}

#[test]
fn test_query_json_is_tagged() {
    let json = r#"{"kind":"delete","table":{"schema":"shop","title":"orders"},"where":"id = 3"}"#;
    let query: Query = serde_json::from_str(json).unwrap();
    assert_eq!(query.kind(), StatementKind::Delete);
    assert_eq!(query.target(), Some(&orders()));

    let edit: Query = serde_json::from_str(
        r#"{"kind":"edit","table":{"schema":"s","title":"t"},"fields":[{"name":"x","type":"INT","isPK":true}]}"#,
    )
    .unwrap();
    assert_eq!(edit.kind(), StatementKind::Edit);
    assert!(edit.kind().is_ddl());
}
