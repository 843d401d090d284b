use serde_json::json;
use sqlx_sqlite_ddl::{
   Column, CreateTable, CreateView, ForeignKey, RenameTable, SchemaChangeSet, SchemaStatement,
};

#[test]
fn deserializes_tagged_change_set() {
   let payload = json!([
      {
         "action": "create_table",
         "table_name": "categories",
         "columns": [
            { "name": "category_id", "data_type": "INTEGER", "not_null": true, "unique": true },
            { "name": "category_name", "data_type": "TEXT", "not_null": true }
         ]
      },
      {
         "action": "create_table",
         "table_name": "product_categories",
         "comment": "links products to categories",
         "columns": [
            { "name": "product_id", "data_type": "INTEGER", "not_null": true },
            { "name": "category_id", "data_type": "INTEGER", "not_null": true }
         ],
         "foreign_keys": [
            {
               "reference_to": "categories",
               "column_pairs": [["category_id", "category_id"]],
               "on_delete": "CASCADE"
            }
         ]
      },
      { "action": "rename_table", "old_name": "categories", "new_name": "groups" },
      { "action": "create_index", "index": { "name": "idx_pc", "table": "product_categories", "columns": ["product_id"] } },
      { "action": "drop_index", "index_name": "idx_pc" },
      { "action": "create_view", "view_name": "v", "sql": "SELECT 1;" },
      { "action": "drop_view", "view_name": "v" },
      { "action": "drop_table", "table_name": "product_categories" }
   ]);

   let changes: SchemaChangeSet = serde_json::from_value(payload).unwrap();
   let actions: Vec<&str> = changes.statements().iter().map(|s| s.action()).collect();

   assert_eq!(
      actions,
      vec![
         "create_table",
         "create_table",
         "rename_table",
         "create_index",
         "drop_index",
         "create_view",
         "drop_view",
         "drop_table",
      ]
   );

   let SchemaStatement::CreateTable(table) = &changes.statements()[1] else {
      panic!("expected create_table");
   };
   assert_eq!(table.comment.as_deref(), Some("links products to categories"));
   assert_eq!(
      table.foreign_keys[0],
      ForeignKey::new("categories", [("category_id", "category_id")]).on_delete("CASCADE")
   );
   assert!(table.indexes.is_empty());
   assert!(!table.columns[0].primary_key);
}

#[test]
fn rejects_unknown_action() {
   let payload = json!([{ "action": "truncate_table", "table_name": "users" }]);
   let err = serde_json::from_value::<SchemaChangeSet>(payload).unwrap_err();
   assert!(err.to_string().contains("truncate_table"), "got: {err}");
}

#[test]
fn rejects_missing_action() {
   let payload = json!([{ "table_name": "users" }]);
   assert!(serde_json::from_value::<SchemaChangeSet>(payload).is_err());
}

#[test]
fn rejects_fields_of_another_variant() {
   // drop_table tagged but carrying rename_table fields
   let payload = json!([{ "action": "drop_table", "old_name": "a", "new_name": "b" }]);
   assert!(serde_json::from_value::<SchemaChangeSet>(payload).is_err());
}

#[test]
fn rejects_extra_fields_next_to_valid_ones() {
   let payload = json!([{ "action": "drop_table", "table_name": "t", "view_name": "v" }]);
   let err = serde_json::from_value::<SchemaChangeSet>(payload).unwrap_err();
   assert!(err.to_string().contains("view_name"), "got: {err}");

   // Nested definitions are strict too
   let payload = json!([{
      "action": "create_table",
      "table_name": "t",
      "columns": [{ "name": "id", "data_type": "INTEGER", "nullable": false }]
   }]);
   let err = serde_json::from_value::<SchemaChangeSet>(payload).unwrap_err();
   assert!(err.to_string().contains("nullable"), "got: {err}");
}

#[test]
fn serializes_with_action_tag() {
   let mut changes = SchemaChangeSet::new();
   changes.push(RenameTable::new("users", "customers"));
   changes.push(
      CreateTable::new("t").with_column(Column::new("id", "INTEGER").with_default("0")),
   );
   changes.push(CreateView::new("v", "SELECT * FROM t"));

   let value = serde_json::to_value(&changes).unwrap();

   assert_eq!(
      value,
      json!([
         { "action": "rename_table", "old_name": "users", "new_name": "customers" },
         {
            "action": "create_table",
            "table_name": "t",
            "columns": [{
               "name": "id",
               "data_type": "INTEGER",
               "primary_key": false,
               "unique": false,
               "not_null": false,
               "default": "0"
            }],
            "foreign_keys": [],
            "indexes": []
         },
         { "action": "create_view", "view_name": "v", "sql": "SELECT * FROM t" }
      ])
   );
}
